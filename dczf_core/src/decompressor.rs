//! Sequential decompressor: parse the header, then decode, checksum, and
//! write each chunk in order.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use dczf_shared::error::{io_err, DczfError, Result};
use dczf_shared::stats::StatsTimer;

use crate::checksum::{constant_time_eq, sha256_of};
use crate::chunk;
use crate::container;
use crate::huffman::build_codes_and_decoder;

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::SeqCst))
}

fn remove_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("cleanup failed to remove {}: {e}", path.display());
        }
    }
}

/// Decompresses the container at `input_path` into `output_path`.
///
/// `progress`/`cancel`/`stats` behave as in [`crate::compressor::compress`].
/// Any checksum or size mismatch deletes the partial `output_path` before
/// returning the error.
pub fn decompress(
    input_path: &Path,
    output_path: &Path,
    mut progress: Option<&mut dyn FnMut(f64)>,
    cancel: Option<&AtomicBool>,
    mut stats: Option<&mut StatsTimer>,
) -> Result<()> {
    let result = decompress_inner(
        input_path,
        output_path,
        progress.as_deref_mut(),
        cancel,
        stats.as_deref_mut(),
    );
    if result.is_err() {
        remove_if_exists(output_path);
    }
    result
}

fn decompress_inner(
    input_path: &Path,
    output_path: &Path,
    mut progress: Option<&mut dyn FnMut(f64)>,
    cancel: Option<&AtomicBool>,
    mut stats: Option<&mut StatsTimer>,
) -> Result<()> {
    let input_meta = fs::metadata(input_path).map_err(|e| io_err(input_path, e))?;
    if input_meta.len() == 0 {
        return Err(DczfError::InvalidInput(format!(
            "{} is empty",
            input_path.display()
        )));
    }

    let input_file = File::open(input_path).map_err(|e| io_err(input_path, e))?;
    let mut input = BufReader::new(input_file);

    let header_section = stats.as_deref_mut().map(|t| t.start_section("Header parse"));
    let header = container::read_header(&mut input)?;
    if let Some(section) = header_section {
        if let Some(t) = stats.as_deref_mut() {
            t.add_section(section.end());
        }
    }

    log::info!(
        "decompressing {} ({} chunks, {} bytes expected)",
        input_path.display(),
        header.num_chunks(),
        header.original_file_size
    );

    if header.chunks.is_empty() {
        if header.original_file_size != 0 {
            return Err(DczfError::Corrupt {
                at_chunk: container::HEADER_PSEUDO_CHUNK,
                reason: "zero chunks but non-zero original_file_size".to_string(),
            });
        }
        File::create(output_path).map_err(|e| io_err(output_path, e))?;
        return Ok(());
    }

    let output_file = File::create(output_path).map_err(|e| io_err(output_path, e))?;
    let mut output = BufWriter::new(output_file);

    let num_chunks = header.num_chunks();
    let mut total_written: u64 = 0;
    let chunk_section = stats.as_deref_mut().map(|t| t.start_section("Chunk decode"));

    for meta in &header.chunks {
        if is_cancelled(cancel) {
            log::warn!("decompression cancelled at chunk {}", meta.chunk_index);
            return Err(DczfError::Cancelled);
        }

        let mut encoded = vec![0u8; meta.compressed_size as usize];
        input.read_exact(&mut encoded).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DczfError::Corrupt {
                    at_chunk: meta.chunk_index,
                    reason: format!("EOF reading {} compressed bytes", meta.compressed_size),
                }
            } else {
                io_err(input_path, e)
            }
        })?;

        let (_, decoder) = build_codes_and_decoder(&meta.code_lengths);
        let decoded = chunk::decode(&encoded, meta.original_size, &decoder, meta.chunk_index)?;

        let actual_checksum = sha256_of(&decoded);
        if !constant_time_eq(&actual_checksum, &meta.checksum) {
            log::error!("checksum mismatch at chunk {}", meta.chunk_index);
            return Err(DczfError::ChecksumMismatch {
                chunk_index: meta.chunk_index,
            });
        }

        output
            .write_all(&decoded)
            .map_err(|e| io_err(output_path, e))?;
        total_written += decoded.len() as u64;

        if meta.chunk_index % 50 == 49 {
            output.flush().map_err(|e| io_err(output_path, e))?;
        }
        if let Some(cb) = progress.as_mut() {
            cb((meta.chunk_index + 1) as f64 / num_chunks.max(1) as f64);
        }
        log::debug!(
            "chunk {}: {} bytes decoded and verified",
            meta.chunk_index,
            decoded.len()
        );
    }

    if let Some(section) = chunk_section {
        if let Some(t) = stats.as_deref_mut() {
            t.add_section(section.end());
        }
    }

    output.flush().map_err(|e| io_err(output_path, e))?;
    let output_file = output
        .into_inner()
        .map_err(|e| io_err(output_path, e.into_error()))?;
    output_file.sync_all().map_err(|e| io_err(output_path, e))?;

    if total_written != header.original_file_size {
        return Err(DczfError::SizeMismatch {
            expected: header.original_file_size,
            actual: total_written,
        });
    }
    let final_len = fs::metadata(output_path)
        .map_err(|e| io_err(output_path, e))?
        .len();
    if final_len != header.original_file_size {
        return Err(DczfError::SizeMismatch {
            expected: header.original_file_size,
            actual: final_len,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::compress;
    use std::io::Write as _;

    fn write_temp(name: &str, data: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        (dir, path)
    }

    #[test]
    fn corrupted_payload_byte_causes_checksum_mismatch_and_no_output() {
        let (dir, input_path) = write_temp("in.txt", b"ABRACADABRA");
        let output_path = dir.path().join("out.dczf");
        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let mut bytes = fs::read(&output_path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&output_path, &bytes).unwrap();

        let restored_path = dir.path().join("restored.txt");
        let err = decompress(&output_path, &restored_path, None, None, None).unwrap_err();
        assert!(matches!(err, DczfError::ChecksumMismatch { chunk_index: 0 }));
        assert!(!restored_path.exists());
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let (dir, input_path) = write_temp("in.txt", b"ABRACADABRA");
        let output_path = dir.path().join("out.dczf");
        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let mut bytes = fs::read(&output_path).unwrap();
        bytes.truncate(bytes.len() - 1);
        fs::write(&output_path, &bytes).unwrap();

        let restored_path = dir.path().join("restored.txt");
        let err = decompress(&output_path, &restored_path, None, None, None).unwrap_err();
        assert!(matches!(err, DczfError::Corrupt { .. }));
    }

    #[test]
    fn flipped_magic_is_rejected_without_reading_further() {
        let (dir, input_path) = write_temp("in.txt", b"ABRACADABRA");
        let output_path = dir.path().join("out.dczf");
        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let mut bytes = fs::read(&output_path).unwrap();
        bytes[0] ^= 0xFF;
        fs::write(&output_path, &bytes).unwrap();

        let restored_path = dir.path().join("restored.txt");
        let err = decompress(&output_path, &restored_path, None, None, None).unwrap_err();
        assert!(matches!(err, DczfError::BadMagic));
    }

    #[test]
    fn empty_input_round_trips_to_empty_file() {
        let (dir, input_path) = write_temp("empty.txt", b"");
        let output_path = dir.path().join("out.dczf");
        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let restored_path = dir.path().join("restored.txt");
        decompress(&output_path, &restored_path, None, None, None).unwrap();
        assert_eq!(fs::read(&restored_path).unwrap(), b"");
    }
}
