//! Two-phase streaming compressor: chunks are encoded straight into a
//! sibling spool file, and only once every chunk has been processed (so
//! `compressed_offset` and `global_checksum` are both known) is the real
//! header written and the spool copied into the final file.
//!
//! This ordering exists so a crash mid-run never leaves a syntactically
//! valid but semantically stale header at `output_path`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dczf_shared::error::{io_err, DczfError, Result};
use dczf_shared::stats::StatsTimer;

use crate::checksum::{sha256_of, StreamingDigest};
use crate::chunk;
use crate::container::{self, ChunkMetadata, CompressionHeader};
use crate::histogram::histogram;
use crate::huffman::build_code_lengths;

/// I/O buffer size used while reading/writing chunk data to the spool.
const SPOOL_BUFFER_BYTES: usize = 1024 * 1024;
/// Buffer size used while copying the finished spool into the final file.
const COPY_BUFFER_BYTES: usize = 64 * 1024;
/// Flush the spool writer every this many chunks.
const FLUSH_EVERY_N_CHUNKS: u64 = 10;

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn file_mtime_ms(meta: &fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn remove_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("cleanup failed to remove {}: {e}", path.display());
        }
    }
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::SeqCst))
}

/// Compresses `input_path` into a self-describing container at
/// `output_path`, chunking at `chunk_size_bytes`.
///
/// `progress` is called after each chunk with the fraction `[0.0, 1.0]`
/// complete. `cancel`, if set, is polled between chunks; observing it set
/// aborts the run with [`DczfError::Cancelled`] and cleans up partial
/// output. `stats`, if set, records per-phase timings for the caller to
/// report (the CLI's `--stats` flag; the core pays nothing for this when
/// `None`).
pub fn compress(
    input_path: &Path,
    output_path: &Path,
    chunk_size_bytes: u32,
    mut progress: Option<&mut dyn FnMut(f64)>,
    cancel: Option<&AtomicBool>,
    mut stats: Option<&mut StatsTimer>,
) -> Result<()> {
    let input_meta = fs::metadata(input_path).map_err(|e| io_err(input_path, e))?;
    if !input_meta.is_file() {
        return Err(DczfError::InvalidInput(format!(
            "{} is not a regular file",
            input_path.display()
        )));
    }

    let original_file_size = input_meta.len();
    let chunk_size = chunk_size_bytes as u64;
    let num_chunks = original_file_size.div_ceil(chunk_size.max(1));
    if num_chunks > container::MAX_CHUNKS {
        return Err(DczfError::TooManyChunks { required: num_chunks });
    }

    let temp_path = PathBuf::from(format!(
        "{}.tmp.{}",
        output_path.display(),
        now_unix_ms()
    ));

    let result = compress_inner(
        input_path,
        output_path,
        &temp_path,
        &input_meta,
        original_file_size,
        num_chunks as u32,
        chunk_size_bytes,
        progress.as_deref_mut(),
        cancel,
        stats.as_deref_mut(),
    );

    // The temp file is scratch space; it is removed regardless of outcome.
    remove_if_exists(&temp_path);
    if result.is_err() {
        remove_if_exists(output_path);
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn compress_inner(
    input_path: &Path,
    output_path: &Path,
    temp_path: &Path,
    input_meta: &fs::Metadata,
    original_file_size: u64,
    num_chunks: u32,
    chunk_size_bytes: u32,
    mut progress: Option<&mut dyn FnMut(f64)>,
    cancel: Option<&AtomicBool>,
    mut stats: Option<&mut StatsTimer>,
) -> Result<()> {
    let mut input = File::open(input_path).map_err(|e| io_err(input_path, e))?;
    let spool_file = File::create(temp_path).map_err(|e| io_err(temp_path, e))?;
    let mut spool = BufWriter::with_capacity(SPOOL_BUFFER_BYTES, spool_file);

    let mut global = StreamingDigest::new();
    let mut chunks = Vec::with_capacity(num_chunks as usize);
    let mut running_compressed_offset: u64 = 0;
    let chunk_size = chunk_size_bytes as u64;

    log::info!(
        "compressing {} ({num_chunks} chunks of {chunk_size_bytes} bytes)",
        input_path.display()
    );

    let mut read_buf = vec![0u8; chunk_size_bytes as usize];
    let chunk_section = stats.as_deref_mut().map(|t| t.start_section("Chunk processing"));

    for chunk_index in 0..num_chunks {
        if is_cancelled(cancel) {
            log::warn!("compression cancelled at chunk {chunk_index}");
            return Err(DczfError::Cancelled);
        }

        let original_offset = chunk_index as u64 * chunk_size;
        let k = chunk_size.min(original_file_size - original_offset) as usize;

        input
            .seek(SeekFrom::Start(original_offset))
            .map_err(|e| io_err(input_path, e))?;
        input
            .read_exact(&mut read_buf[..k])
            .map_err(|e| io_err(input_path, e))?;
        if k == 0 && original_file_size > 0 {
            return Err(io_err(
                input_path,
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read mid-chunk"),
            ));
        }
        let data = &read_buf[..k];

        let chunk_checksum = sha256_of(data);
        global.update(&chunk_checksum);

        let freq = histogram(data);
        let code_lengths = build_code_lengths(&freq);
        let (codes, _decoder) = crate::huffman::build_codes_and_decoder(&code_lengths);
        let encoded = chunk::encode(data, &codes);

        spool
            .write_all(&encoded)
            .map_err(|e| io_err(temp_path, e))?;

        chunks.push(ChunkMetadata {
            chunk_index,
            original_offset,
            original_size: k as u32,
            compressed_offset: running_compressed_offset,
            compressed_size: encoded.len() as u32,
            checksum: chunk_checksum,
            code_lengths,
        });
        running_compressed_offset += encoded.len() as u64;

        if (chunk_index as u64 + 1) % FLUSH_EVERY_N_CHUNKS == 0 {
            spool.flush().map_err(|e| io_err(temp_path, e))?;
        }
        if let Some(cb) = progress.as_mut() {
            cb((chunk_index + 1) as f64 / num_chunks.max(1) as f64);
        }
        log::debug!("chunk {chunk_index}: {k} bytes -> {} bytes", encoded.len());
    }

    spool.flush().map_err(|e| io_err(temp_path, e))?;
    drop(spool);
    if let Some(section) = chunk_section {
        if let Some(t) = stats.as_deref_mut() {
            t.add_section(section.end());
        }
    }
    let write_section = stats.as_deref_mut().map(|t| t.start_section("Header and payload write"));

    let spool_len = fs::metadata(temp_path)
        .map_err(|e| io_err(temp_path, e))?
        .len();
    if spool_len != running_compressed_offset {
        return Err(DczfError::Corrupt {
            at_chunk: container::HEADER_PSEUDO_CHUNK,
            reason: format!(
                "spool file length {spool_len} does not match accumulated compressed size {running_compressed_offset}"
            ),
        });
    }
    if num_chunks > 0 && spool_len == 0 {
        return Err(DczfError::Corrupt {
            at_chunk: container::HEADER_PSEUDO_CHUNK,
            reason: "spool file is empty for a non-empty input".to_string(),
        });
    }

    let global_checksum = global.finalize();
    let original_filename = input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let header = CompressionHeader {
        version: container::CURRENT_VERSION,
        original_filename,
        original_file_size,
        original_timestamp_ms: file_mtime_ms(input_meta),
        chunk_size_bytes,
        global_checksum,
        chunks,
    };

    let output_file = File::create(output_path).map_err(|e| io_err(output_path, e))?;
    let mut output = BufWriter::new(output_file);
    container::write_header(&mut output, &header).map_err(|e| io_err(output_path, e))?;

    let mut spool_reader =
        BufReader::with_capacity(COPY_BUFFER_BYTES, File::open(temp_path).map_err(|e| io_err(temp_path, e))?);
    std::io::copy(&mut spool_reader, &mut output).map_err(|e| io_err(output_path, e))?;

    let output_file = output.into_inner().map_err(|e| io_err(output_path, e.into_error()))?;
    output_file.sync_all().map_err(|e| io_err(output_path, e))?;

    let final_meta = fs::metadata(output_path).map_err(|e| io_err(output_path, e))?;
    if original_file_size > 0 && final_meta.len() == 0 {
        return Err(DczfError::Corrupt {
            at_chunk: container::HEADER_PSEUDO_CHUNK,
            reason: "final output file is empty for a non-empty input".to_string(),
        });
    }

    if let Some(section) = write_section {
        if let Some(t) = stats.as_deref_mut() {
            t.add_section(section.end());
        }
    }

    log::info!(
        "compressed {} -> {} ({num_chunks} chunks, {} bytes payload)",
        input_path.display(),
        output_path.display(),
        running_compressed_offset
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompressor::decompress;
    use std::io::Write as _;

    fn write_temp(name: &str, data: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        (dir, path)
    }

    #[test]
    fn compresses_and_round_trips_small_input() {
        let (dir, input_path) = write_temp("in.txt", b"ABRACADABRA");
        let output_path = dir.path().join("out.dczf");

        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();
        assert!(output_path.exists());

        let restored_path = dir.path().join("restored.txt");
        decompress(&output_path, &restored_path, None, None, None).unwrap();
        let restored = fs::read(&restored_path).unwrap();
        assert_eq!(restored, b"ABRACADABRA");
    }

    #[test]
    fn empty_input_produces_header_only_container() {
        let (dir, input_path) = write_temp("empty.txt", b"");
        let output_path = dir.path().join("out.dczf");

        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let bytes = fs::read(&output_path).unwrap();
        let header = container::read_header(&mut &bytes[..]).unwrap();
        assert_eq!(header.num_chunks(), 0);
        assert_eq!(header.original_file_size, 0);
    }

    #[test]
    fn multi_chunk_input_round_trips() {
        let data = vec![0x00u8; 3 * 1024 * 1024];
        let (dir, input_path) = write_temp("zeros.bin", &data);
        let output_path = dir.path().join("out.dczf");

        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let bytes = fs::read(&output_path).unwrap();
        let header = container::read_header(&mut &bytes[..]).unwrap();
        assert_eq!(header.num_chunks(), 3);
        for chunk in &header.chunks {
            assert_eq!(chunk.code_lengths[0], 1);
        }

        let restored_path = dir.path().join("restored.bin");
        decompress(&output_path, &restored_path, None, None, None).unwrap();
        assert_eq!(fs::read(&restored_path).unwrap(), data);
    }

    #[test]
    fn temp_file_is_removed_after_success() {
        let (dir, input_path) = write_temp("in.txt", b"hello");
        let output_path = dir.path().join("out.dczf");
        compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap();

        let leftover_tmp = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().contains(".tmp."));
        assert!(!leftover_tmp);
    }

    #[test]
    fn missing_input_is_invalid_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("does-not-exist.txt");
        let output_path = dir.path().join("out.dczf");
        let err = compress(&input_path, &output_path, 1024 * 1024, None, None, None).unwrap_err();
        assert!(matches!(err, DczfError::Io { .. }));
    }
}
