//! Command-line argument definitions and validation, in the same shape as
//! the other per-module CLIs in this workspace: a `clap`-derive `CliArgs`,
//! a post-parse `validate()` pass that checks the filesystem (not just
//! syntax), and a `CliError` that wraps both validation and `clap` parse
//! failures.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// The three operations this tool exposes.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compresses `input` into a dczf container at `output`.
    #[clap(alias = "c")]
    Compress {
        input: PathBuf,
        output: PathBuf,
        /// Chunk size in mebibytes; each chunk gets its own code table.
        #[arg(long = "chunk-size-mb", default_value_t = dczf_shared::config::DEFAULT_CHUNK_SIZE_MB)]
        chunk_size_mb: u32,
    },

    /// Decompresses a dczf container at `input` back into `output`.
    #[clap(alias = "d")]
    Decompress { input: PathBuf, output: PathBuf },

    /// Checks a dczf container's structural integrity without decoding it.
    #[clap(alias = "v")]
    Verify { compressed: PathBuf },
}

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Chunked canonical-Huffman file compressor.",
    long_about = "Compresses and decompresses files using independently-coded, fixed-size chunks in a single self-describing container."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Prints a compression/decompression report after the run completes.
    #[arg(short, long)]
    pub stats: bool,

    /// Diagnostic verbosity, overriding `RUST_LOG` when set.
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl CliArgs {
    /// Validates paths named by the chosen subcommand: the input must
    /// exist and be a regular file, and the output's parent directory must
    /// already exist.
    pub fn validate(&self) -> Result<(), CliError> {
        let (in_path, out_path) = match &self.command {
            Commands::Compress { input, output, .. } => (input, Some(output)),
            Commands::Decompress { input, output } => (input, Some(output)),
            Commands::Verify { compressed } => (compressed, None),
        };

        if !in_path.exists() {
            return Err(CliError::InputFileNotFound(in_path.clone()));
        }
        if !in_path.is_file() {
            return Err(CliError::InputNotFile(in_path.clone()));
        }

        if let Some(out_path) = out_path {
            if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.exists() {
                    return Err(CliError::OutputParentDirNotFound(parent.to_path_buf()));
                }
                if !parent.is_dir() {
                    return Err(CliError::OutputParentNotDir(parent.to_path_buf()));
                }
            }
        }

        Ok(())
    }
}

/// Errors encountered while parsing or validating command-line arguments,
/// before any compression work begins.
#[derive(Debug)]
pub enum CliError {
    InputFileNotFound(PathBuf),
    InputNotFile(PathBuf),
    OutputParentDirNotFound(PathBuf),
    OutputParentNotDir(PathBuf),
    ClapError(clap::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::InputFileNotFound(path) => {
                write!(f, "input file not found: {}", path.display())
            }
            CliError::InputNotFile(path) => {
                write!(f, "input path is not a regular file: {}", path.display())
            }
            CliError::OutputParentDirNotFound(path) => {
                write!(f, "output directory does not exist: {}", path.display())
            }
            CliError::OutputParentNotDir(path) => {
                write!(f, "output parent is not a directory: {}", path.display())
            }
            CliError::ClapError(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ClapError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<clap::Error> for CliError {
    fn from(error: clap::Error) -> Self {
        CliError::ClapError(error)
    }
}

/// Parses `std::env::args()` into validated [`CliArgs`].
pub fn parse_args() -> Result<CliArgs, CliError> {
    let args = CliArgs::try_parse()?;
    args.validate()?;
    Ok(args)
}
