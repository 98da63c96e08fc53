//! Shared types used by both the `dczf_core` codec and the `dczf` CLI:
//! the error taxonomy, run configuration, and performance/stat reporting.

pub mod config;
pub mod error;
pub mod stats;

pub use config::Config;
pub use error::{DczfError, Result};
