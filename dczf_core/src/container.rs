//! The container's binary layout: header, per-chunk metadata, and the
//! big-endian (de)serialization of both.
//!
//! This module only knows about bytes in and structs out. It has no
//! opinion on filesystem paths — callers that read/write real files (see
//! [`crate::compressor`]/[`crate::decompressor`]) attach path context to
//! I/O failures themselves; a failure while parsing an already-open stream
//! is a format problem (`Corrupt`/`BadMagic`/`UnsupportedVersion`), not a
//! filesystem one.

use std::io::{self, Read, Write};

use dczf_shared::error::DczfError;

use crate::huffman::CodeLengths;

pub const MAGIC: u32 = 0x44435A46;
pub const CURRENT_VERSION: u32 = 1;

/// Maximum `num_chunks` the format can address, per §3/§4.G: chunk indices
/// are `u32` but the compressor additionally rejects counts that would not
/// fit in a signed 31-bit count.
pub const MAX_CHUNKS: u64 = (1u64 << 31) - 1;

/// Sentinel `at_chunk` used for corruption detected while parsing the
/// header itself, before any chunk-specific context exists.
pub const HEADER_PSEUDO_CHUNK: u32 = u32::MAX;

/// Per-chunk metadata, one record per chunk, serialized in chunk order
/// immediately after the fixed header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub chunk_index: u32,
    pub original_offset: u64,
    pub original_size: u32,
    pub compressed_offset: u64,
    pub compressed_size: u32,
    pub checksum: [u8; 32],
    pub code_lengths: CodeLengths,
}

/// Top-level container metadata: everything needed to validate and decode
/// the payload that follows it in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionHeader {
    pub version: u32,
    pub original_filename: String,
    pub original_file_size: u64,
    pub original_timestamp_ms: u64,
    pub chunk_size_bytes: u32,
    pub global_checksum: [u8; 32],
    pub chunks: Vec<ChunkMetadata>,
}

impl CompressionHeader {
    pub fn num_chunks(&self) -> u32 {
        self.chunks.len() as u32
    }
}

fn write_u16<W: Write>(w: &mut W, v: u16) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}
fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}
fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}
fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}
fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

fn write_code_lengths<W: Write>(w: &mut W, lens: &CodeLengths) -> io::Result<()> {
    // Each length widened to a big-endian u16 with a zero high byte, per
    // the on-wire layout: 512 bytes per chunk rather than 256.
    let mut wire = [0u8; 512];
    for (i, &len) in lens.iter().enumerate() {
        wire[i * 2] = 0;
        wire[i * 2 + 1] = len;
    }
    w.write_all(&wire)
}

fn read_code_lengths<R: Read>(r: &mut R) -> io::Result<CodeLengths> {
    let mut wire = [0u8; 512];
    r.read_exact(&mut wire)?;
    let mut lens = [0u8; 256];
    for i in 0..256 {
        // High byte is documented as always zero on write; ignored on read.
        lens[i] = wire[i * 2 + 1];
    }
    Ok(lens)
}

fn write_chunk_metadata<W: Write>(w: &mut W, meta: &ChunkMetadata) -> io::Result<()> {
    write_u32(w, meta.chunk_index)?;
    write_u64(w, meta.original_offset)?;
    write_u32(w, meta.original_size)?;
    write_u64(w, meta.compressed_offset)?;
    write_u32(w, meta.compressed_size)?;
    w.write_all(&meta.checksum)?;
    write_code_lengths(w, &meta.code_lengths)
}

fn read_chunk_metadata<R: Read>(r: &mut R) -> io::Result<ChunkMetadata> {
    let chunk_index = read_u32(r)?;
    let original_offset = read_u64(r)?;
    let original_size = read_u32(r)?;
    let compressed_offset = read_u64(r)?;
    let compressed_size = read_u32(r)?;
    let mut checksum = [0u8; 32];
    r.read_exact(&mut checksum)?;
    let code_lengths = read_code_lengths(r)?;
    Ok(ChunkMetadata {
        chunk_index,
        original_offset,
        original_size,
        compressed_offset,
        compressed_size,
        checksum,
        code_lengths,
    })
}

/// Writes `header` in the on-wire big-endian layout. Callers that wrap a
/// real file attach path context to any I/O error returned here.
pub fn write_header<W: Write>(sink: &mut W, header: &CompressionHeader) -> io::Result<()> {
    write_u32(sink, MAGIC)?;
    write_u32(sink, header.version)?;

    let filename_bytes = header.original_filename.as_bytes();
    write_u16(sink, filename_bytes.len() as u16)?;
    sink.write_all(filename_bytes)?;

    write_u64(sink, header.original_file_size)?;
    write_u64(sink, header.original_timestamp_ms)?;
    write_u32(sink, header.chunk_size_bytes)?;
    sink.write_all(&header.global_checksum)?;
    write_u32(sink, header.num_chunks())?;

    for chunk in &header.chunks {
        write_chunk_metadata(sink, chunk)?;
    }
    Ok(())
}

/// Parses a [`CompressionHeader`] from `source`, validating magic, version,
/// and chunk-count sanity as it goes. Any I/O failure while reading an
/// already-open stream (including truncation) is surfaced as `Corrupt`,
/// since by this point filesystem-level open/permission errors have
/// already been ruled out by the caller.
pub fn read_header<R: Read>(source: &mut R) -> Result<CompressionHeader, DczfError> {
    let corrupt = |reason: String| DczfError::Corrupt {
        at_chunk: HEADER_PSEUDO_CHUNK,
        reason,
    };

    let magic = read_u32(source).map_err(|e| corrupt(format!("reading magic: {e}")))?;
    if magic != MAGIC {
        return Err(DczfError::BadMagic);
    }

    let version = read_u32(source).map_err(|e| corrupt(format!("reading version: {e}")))?;
    if version != CURRENT_VERSION {
        return Err(DczfError::UnsupportedVersion { found: version });
    }

    let filename_len =
        read_u16(source).map_err(|e| corrupt(format!("reading filename length: {e}")))?;
    let mut filename_bytes = vec![0u8; filename_len as usize];
    source
        .read_exact(&mut filename_bytes)
        .map_err(|e| corrupt(format!("reading filename: {e}")))?;
    let original_filename = String::from_utf8(filename_bytes)
        .map_err(|e| corrupt(format!("filename is not valid UTF-8: {e}")))?;

    let original_file_size =
        read_u64(source).map_err(|e| corrupt(format!("reading original_file_size: {e}")))?;
    let original_timestamp_ms =
        read_u64(source).map_err(|e| corrupt(format!("reading original_timestamp_ms: {e}")))?;
    let chunk_size_bytes =
        read_u32(source).map_err(|e| corrupt(format!("reading chunk_size_bytes: {e}")))?;

    let mut global_checksum = [0u8; 32];
    source
        .read_exact(&mut global_checksum)
        .map_err(|e| corrupt(format!("reading global_checksum: {e}")))?;

    let num_chunks =
        read_u32(source).map_err(|e| corrupt(format!("reading num_chunks: {e}")))?;
    if num_chunks as u64 > MAX_CHUNKS {
        return Err(DczfError::TooManyChunks {
            required: num_chunks as u64,
        });
    }

    let mut chunks = Vec::with_capacity(num_chunks as usize);
    for i in 0..num_chunks {
        let meta = read_chunk_metadata(source)
            .map_err(|e| corrupt(format!("reading chunk {i} metadata: {e}")))?;
        if meta.chunk_index != i {
            return Err(corrupt(format!(
                "chunk metadata out of order: expected index {i}, found {}",
                meta.chunk_index
            )));
        }
        chunks.push(meta);
    }

    Ok(CompressionHeader {
        version,
        original_filename,
        original_file_size,
        original_timestamp_ms,
        chunk_size_bytes,
        global_checksum,
        chunks,
    })
}
