//! Configuration recognized by the compressor/decompressor (spec §6).

use log::LevelFilter;

/// Default chunk size used when nothing else is configured: 512 MiB,
/// matching the reference implementation.
pub const DEFAULT_CHUNK_SIZE_MB: u32 = 512;

const MIB: u64 = 1024 * 1024;

/// Run configuration for a single compress/decompress invocation.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Size of each independently-compressed chunk, in bytes.
    pub chunk_size_bytes: u32,
    /// Diagnostic verbosity; the CLI installs a logger honoring this.
    pub log_level: LevelFilter,
}

impl Config {
    /// Builds a `Config` from the `chunk_size_mb` key of spec §6.
    ///
    /// # Panics
    ///
    /// Does not panic; a `chunk_size_mb` of 0 is clamped to 1. A value whose
    /// byte size would overflow `u32` (anything from 4096 MiB up) saturates
    /// to `u32::MAX` rather than wrapping around to a degenerate small or
    /// zero chunk size.
    pub fn with_chunk_size_mb(chunk_size_mb: u32) -> Self {
        let mb = chunk_size_mb.max(1) as u64;
        let bytes = (mb * MIB).min(u32::MAX as u64) as u32;
        Config {
            chunk_size_bytes: bytes,
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size_bytes: (DEFAULT_CHUNK_SIZE_MB as u64 * MIB) as u32,
            log_level: LevelFilter::Info,
        }
    }
}
