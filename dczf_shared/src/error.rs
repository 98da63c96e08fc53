//! The error taxonomy for the compressor/decompressor core.
//!
//! Mirrors the manual `Display`/`Error` style used elsewhere in this
//! workspace rather than a derive macro: every variant spells out exactly
//! what went wrong and where, since callers (the CLI, tests) match on it.

use std::fmt::{self, Display};
use std::path::PathBuf;

/// Every way a compress/decompress/verify call can fail.
#[derive(Debug)]
pub enum DczfError {
    /// A filesystem operation (open/read/write/flush/sync/rename) failed.
    Io { path: PathBuf, cause: std::io::Error },
    /// The input file is missing, empty when it shouldn't be, or unreadable.
    InvalidInput(String),
    /// `num_chunks` for this input would exceed `2^31 - 1`.
    TooManyChunks { required: u64 },
    /// The container's magic number did not match `0x44435A46`.
    BadMagic,
    /// The container declares a format version this build does not support.
    UnsupportedVersion { found: u32 },
    /// The container is structurally broken: truncated mid-chunk, a decoder
    /// that ran past `max_length` without a match, or code lengths that
    /// violate the Kraft inequality.
    Corrupt { at_chunk: u32, reason: String },
    /// A chunk's decoded bytes did not hash to its recorded checksum.
    ChecksumMismatch { chunk_index: u32 },
    /// The decompressed total size did not match the header's recorded size.
    SizeMismatch { expected: u64, actual: u64 },
    /// A cooperative cancellation signal was observed between chunks.
    Cancelled,
    /// A blocking I/O call was interrupted by the host.
    Interrupted,
}

impl Display for DczfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DczfError::Io { path, cause } => {
                write!(f, "I/O error at {}: {}", path.display(), cause)
            }
            DczfError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            DczfError::TooManyChunks { required } => {
                write!(
                    f,
                    "input requires {} chunks, which exceeds the 2^31 - 1 limit",
                    required
                )
            }
            DczfError::BadMagic => write!(f, "not a dczf container (bad magic)"),
            DczfError::UnsupportedVersion { found } => {
                write!(f, "unsupported container version: {}", found)
            }
            DczfError::Corrupt { at_chunk, reason } => {
                write!(f, "corrupt container at chunk {}: {}", at_chunk, reason)
            }
            DczfError::ChecksumMismatch { chunk_index } => {
                write!(f, "checksum mismatch at chunk {}", chunk_index)
            }
            DczfError::SizeMismatch { expected, actual } => {
                write!(
                    f,
                    "size mismatch: expected {} bytes, got {} bytes",
                    expected, actual
                )
            }
            DczfError::Cancelled => write!(f, "operation cancelled"),
            DczfError::Interrupted => write!(f, "operation interrupted"),
        }
    }
}

impl std::error::Error for DczfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DczfError::Io { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Convenience alias: every fallible call in this workspace returns this.
pub type Result<T> = std::result::Result<T, DczfError>;

/// Lifts a bare `io::Error` into the workspace error type.
///
/// Most I/O call sites want the path in the error message, so this is the
/// usual way to do it: `file.read(&mut buf).map_err(|e| io_err(&path, e))?`.
/// An error whose kind is `Interrupted` — a blocking call interrupted by the
/// host, not a filesystem failure — becomes `DczfError::Interrupted` instead
/// of `Io`, so callers can distinguish "signalled, retry or abort" from
/// "this path is actually broken."
pub fn io_err(path: impl Into<PathBuf>, cause: std::io::Error) -> DczfError {
    if cause.kind() == std::io::ErrorKind::Interrupted {
        return DczfError::Interrupted;
    }
    DczfError::Io {
        path: path.into(),
        cause,
    }
}
