//! End-to-end tests over the full compress/decompress/verify pipeline.
//!
//! Covers:
//! - Round-trip identity across the boundary inputs (empty, one byte, one
//!   chunk, multi-chunk, random/incompressible data).
//! - Header re-parseability and the structural invariants of the data
//!   model (contiguous offsets, checksum consistency, Kraft).
//! - Deterministic re-compression of the same input.
//! - The three documented failure modes: checksum mismatch, truncation,
//!   and a flipped magic number.

use std::fs::{self, File};
use std::io::Write;

use dczf_core::{compressor, container, decompressor, verify};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

fn write_file(dir: &std::path::Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(data).unwrap();
    path
}

// ── Round-trip identity across boundary inputs ──────────────────────────

#[test]
fn empty_input_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"");
    let compressed = dir.path().join("out.dczf");
    let restored = dir.path().join("restored");

    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();
    decompressor::decompress(&compressed, &restored, None, None, None).unwrap();

    assert_eq!(fs::read(&restored).unwrap(), b"");

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();
    assert_eq!(header.num_chunks(), 0);
    assert_eq!(header.original_file_size, 0);
}

#[test]
fn single_byte_input_gets_a_one_bit_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", &[0x41]);
    let compressed = dir.path().join("out.dczf");
    let restored = dir.path().join("restored");

    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();
    assert_eq!(header.num_chunks(), 1);
    let lens = &header.chunks[0].code_lengths;
    assert_eq!(lens[0x41], 1);
    assert_eq!(lens.iter().filter(|&&l| l > 0).count(), 1);
    assert_eq!(header.chunks[0].compressed_size, 1);

    decompressor::decompress(&compressed, &restored, None, None, None).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), [0x41]);
}

#[test]
fn abracadabra_round_trips_and_checksums_match() {
    let dir = tempfile::tempdir().unwrap();
    let data = b"ABRACADABRA";
    let input = write_file(dir.path(), "in", data);
    let compressed = dir.path().join("out.dczf");
    let restored = dir.path().join("restored");

    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();
    decompressor::decompress(&compressed, &restored, None, None, None).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), data);

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();
    assert_eq!(header.num_chunks(), 1);
    assert_eq!(
        header.chunks[0].checksum,
        dczf_core::checksum::sha256_of(data)
    );
}

#[test]
fn three_chunks_of_zero_bytes_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = vec![0u8; 3 * 1024 * 1024];
    let input = write_file(dir.path(), "in", &data);
    let compressed = dir.path().join("out.dczf");
    let restored = dir.path().join("restored");

    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();
    assert_eq!(header.num_chunks(), 3);
    for chunk in &header.chunks {
        assert_eq!(chunk.compressed_size, (1024 * 1024) / 8);
    }
    let first_checksum = header.chunks[0].checksum;
    assert!(header.chunks.iter().all(|c| c.checksum == first_checksum));

    decompressor::decompress(&compressed, &restored, None, None, None).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), data);
}

#[test]
fn random_incompressible_data_round_trips_across_uneven_chunks() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data = vec![0u8; 5 * 1024 * 1024];
    rng.fill(data.as_mut_slice());

    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", &data);
    let compressed = dir.path().join("out.dczf");
    let restored = dir.path().join("restored");

    compressor::compress(&input, &compressed, 2 * 1024 * 1024, None, None, None).unwrap();

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();
    assert_eq!(header.num_chunks(), 3);
    assert_eq!(header.chunks[0].original_size, 2 * 1024 * 1024);
    assert_eq!(header.chunks[1].original_size, 2 * 1024 * 1024);
    assert_eq!(header.chunks[2].original_size, 1 * 1024 * 1024);
    // Random bytes are incompressible under order-0 Huffman: encoded size
    // is never smaller than the original for a full 256-symbol alphabet.
    for chunk in &header.chunks {
        assert!(chunk.compressed_size >= chunk.original_size);
    }

    decompressor::decompress(&compressed, &restored, None, None, None).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), data);
}

// ── Structural invariants (spec §8 properties) ──────────────────────────

#[test]
fn compressed_offsets_are_contiguous_and_start_at_zero() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut data = vec![0u8; 5 * 1024 * 1024];
    rng.fill(data.as_mut_slice());

    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", &data);
    let compressed = dir.path().join("out.dczf");
    compressor::compress(&input, &compressed, 2 * 1024 * 1024, None, None, None).unwrap();

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();
    assert_eq!(header.chunks[0].compressed_offset, 0);
    for pair in header.chunks.windows(2) {
        assert_eq!(
            pair[0].compressed_offset + pair[0].compressed_size as u64,
            pair[1].compressed_offset
        );
    }
}

#[test]
fn global_checksum_matches_concatenation_of_chunk_checksums() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"ABRACADABRA");
    let compressed = dir.path().join("out.dczf");
    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();

    let bytes = fs::read(&compressed).unwrap();
    let header = container::read_header(&mut &bytes[..]).unwrap();

    let mut digest = dczf_core::checksum::StreamingDigest::new();
    for chunk in &header.chunks {
        digest.update(&chunk.checksum);
    }
    assert_eq!(digest.finalize(), header.global_checksum);
}

#[test]
fn recompressing_identical_input_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"the quick brown fox jumps over the lazy dog");
    let compressed_a = dir.path().join("a.dczf");
    let compressed_b = dir.path().join("b.dczf");

    compressor::compress(&input, &compressed_a, 1024 * 1024, None, None, None).unwrap();
    compressor::compress(&input, &compressed_b, 1024 * 1024, None, None, None).unwrap();

    assert_eq!(fs::read(&compressed_a).unwrap(), fs::read(&compressed_b).unwrap());
}

// ── Verifier ─────────────────────────────────────────────────────────────

#[test]
fn verify_accepts_a_freshly_compressed_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"ABRACADABRA");
    let compressed = dir.path().join("out.dczf");
    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();
    verify::verify(&compressed).unwrap();
}

// ── Documented failure modes ─────────────────────────────────────────────

#[test]
fn corrupting_a_payload_byte_causes_checksum_mismatch_and_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"ABRACADABRA");
    let compressed = dir.path().join("out.dczf");
    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();

    let mut bytes = fs::read(&compressed).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&compressed, &bytes).unwrap();

    let restored = dir.path().join("restored");
    let err = decompressor::decompress(&compressed, &restored, None, None, None).unwrap_err();
    assert!(matches!(
        err,
        dczf_core::DczfError::ChecksumMismatch { chunk_index: 0 }
    ));
    assert!(!restored.exists());
}

#[test]
fn truncating_the_file_causes_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"ABRACADABRA");
    let compressed = dir.path().join("out.dczf");
    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();

    let mut bytes = fs::read(&compressed).unwrap();
    bytes.truncate(bytes.len() - 1);
    fs::write(&compressed, &bytes).unwrap();

    let restored = dir.path().join("restored");
    let err = decompressor::decompress(&compressed, &restored, None, None, None).unwrap_err();
    assert!(matches!(err, dczf_core::DczfError::Corrupt { .. }));
}

#[test]
fn flipping_the_magic_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "in", b"ABRACADABRA");
    let compressed = dir.path().join("out.dczf");
    compressor::compress(&input, &compressed, 1024 * 1024, None, None, None).unwrap();

    let mut bytes = fs::read(&compressed).unwrap();
    bytes[0] ^= 0xFF;
    fs::write(&compressed, &bytes).unwrap();

    let restored = dir.path().join("restored");
    let err = decompressor::decompress(&compressed, &restored, None, None, None).unwrap_err();
    assert!(matches!(err, dczf_core::DczfError::BadMagic));
}
