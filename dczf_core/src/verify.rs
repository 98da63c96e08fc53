//! Structural integrity verification without a full decode: parses the
//! header, walks the payload advancing by each chunk's `compressed_size`,
//! and checks the invariants of the data model hold.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use dczf_shared::error::{io_err, DczfError, Result};

use crate::checksum::StreamingDigest;
use crate::container::{self, HEADER_PSEUDO_CHUNK};
use crate::huffman::kraft_sum_scaled;

/// Verifies `compressed_path` is a structurally sound container: the
/// header parses, chunk offsets are contiguous starting at zero, every
/// chunk's `code_lengths` satisfy the Kraft inequality, the payload has
/// exactly as many bytes as the metadata claims, and the global checksum
/// matches the concatenation of per-chunk checksums.
///
/// Does not decode any chunk or verify per-chunk data checksums — only a
/// full [`crate::decompressor::decompress`] does that.
pub fn verify(compressed_path: &Path) -> Result<()> {
    let input_meta = fs::metadata(compressed_path).map_err(|e| io_err(compressed_path, e))?;
    if input_meta.len() == 0 {
        return Err(DczfError::InvalidInput(format!(
            "{} is empty",
            compressed_path.display()
        )));
    }

    let file = File::open(compressed_path).map_err(|e| io_err(compressed_path, e))?;
    let mut input = BufReader::new(file);
    let header = container::read_header(&mut input)?;

    let mut expected_offset: u64 = 0;
    let mut total_original: u64 = 0;
    let mut global_digest = StreamingDigest::new();

    for meta in &header.chunks {
        if meta.compressed_offset != expected_offset {
            return Err(DczfError::Corrupt {
                at_chunk: meta.chunk_index,
                reason: format!(
                    "expected compressed_offset {expected_offset}, found {}",
                    meta.compressed_offset
                ),
            });
        }

        let (numerator, denominator) = kraft_sum_scaled(&meta.code_lengths);
        if numerator > denominator {
            return Err(DczfError::Corrupt {
                at_chunk: meta.chunk_index,
                reason: "code_lengths violate the Kraft inequality".to_string(),
            });
        }

        let mut skip_buf = vec![0u8; meta.compressed_size as usize];
        input.read_exact(&mut skip_buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DczfError::Corrupt {
                    at_chunk: meta.chunk_index,
                    reason: format!("EOF reading {} payload bytes", meta.compressed_size),
                }
            } else {
                io_err(compressed_path, e)
            }
        })?;

        global_digest.update(&meta.checksum);
        expected_offset += meta.compressed_size as u64;
        total_original += meta.original_size as u64;
    }

    if total_original != header.original_file_size {
        return Err(DczfError::SizeMismatch {
            expected: header.original_file_size,
            actual: total_original,
        });
    }

    let computed_global = global_digest.finalize();
    if computed_global != header.global_checksum {
        return Err(DczfError::Corrupt {
            at_chunk: HEADER_PSEUDO_CHUNK,
            reason: "global_checksum does not match concatenation of per-chunk checksums"
                .to_string(),
        });
    }

    log::info!(
        "{} verified: {} chunks, {} bytes",
        compressed_path.display(),
        header.num_chunks(),
        header.original_file_size
    );

    Ok(())
}
