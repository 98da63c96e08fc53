//! Per-chunk encode/decode: turns a chunk's raw bytes into a bitstream
//! given a code table, and back given a decoder.
//!
//! This module only knows about one chunk's bytes and tables — it has no
//! notion of offsets, checksums, or the container format. Those live in
//! [`crate::container`] and [`crate::compressor`]/[`crate::decompressor`].

use dczf_shared::error::DczfError;

use crate::bitio::{BitReader, BitWriter};
use crate::huffman::{CanonicalDecoder, CodeTable};

/// Encodes `data` using `codes`, emitting each byte's codeword MSB-first.
///
/// # Panics
///
/// Panics if any byte in `data` has no entry in `codes`. Codes are always
/// built from the exact chunk being encoded, so an absent symbol here means
/// the caller passed a mismatched table — a programmer error, not a
/// recoverable one.
pub fn encode(data: &[u8], codes: &CodeTable) -> Vec<u8> {
    let mut writer = BitWriter::with_capacity(data.len());
    for &byte in data {
        let code = codes[byte as usize]
            .unwrap_or_else(|| panic!("chunk byte {byte:#04x} has no assigned code"));
        writer.write_bits(code.codeword, code.length);
    }
    writer.into_bytes()
}

/// Decodes exactly `original_size` symbols from `encoded` using `decoder`.
///
/// Reads one bit at a time, accumulating a candidate code, and tries to
/// resolve it after every bit. Trailing zero-padding bits past the last
/// real codeword are tolerated by [`BitReader`]; if a symbol can't be
/// resolved within `decoder.max_length()` bits the chunk is corrupt.
pub fn decode(
    encoded: &[u8],
    original_size: u32,
    decoder: &CanonicalDecoder,
    chunk_index: u32,
) -> Result<Vec<u8>, DczfError> {
    let mut out = Vec::with_capacity(original_size as usize);
    let mut reader = BitReader::new(encoded);
    let max_length = decoder.max_length();

    for _ in 0..original_size {
        let mut code: u32 = 0;
        let mut len: u8 = 0;
        loop {
            code = (code << 1) | reader.read_bit() as u32;
            len += 1;
            if let Some(symbol) = decoder.decode(code, len) {
                out.push(symbol);
                break;
            }
            if len >= max_length {
                return Err(DczfError::Corrupt {
                    at_chunk: chunk_index,
                    reason: format!(
                        "no symbol resolved within {max_length} bits while decoding"
                    ),
                });
            }
        }
    }

    Ok(out)
}
