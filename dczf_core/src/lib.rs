//! Chunked canonical-Huffman compression core: histogram, code
//! construction, bit-level codec, container format, and the streaming
//! compress/decompress/verify pipelines built on top of them.
//!
//! Modules are layered bottom-up, each building only on the ones above it
//! in this list:
//!
//! `bitio`, `checksum`, `histogram` are leaves. `huffman` builds on none of
//! them. `chunk` builds on `bitio` and `huffman`. `container` builds on
//! `huffman` (for `CodeLengths`). `compressor`/`decompressor`/`verify` tie
//! everything together into whole-file pipelines.

pub mod bitio;
pub mod checksum;
pub mod chunk;
pub mod compressor;
pub mod container;
pub mod decompressor;
pub mod histogram;
pub mod huffman;
pub mod verify;

// Error taxonomy, configuration, and run-statistics reporting are shared
// with the `dczf` binary, so they live in `dczf_shared` rather than being
// duplicated here.
pub use dczf_shared::config::Config;
pub use dczf_shared::error::{DczfError, Result};
pub use dczf_shared::stats;
