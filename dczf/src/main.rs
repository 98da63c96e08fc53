//! Binary entry point: installs the logger, parses and validates CLI
//! arguments, and dispatches into `dczf_core`'s compress/decompress/verify
//! pipelines. This is the only place in the workspace that talks to the
//! process environment (`std::env`, exit codes, stderr).

mod cli_parse;

use std::process::ExitCode;
use std::time::Instant;

use cli_parse::{CliArgs, Commands};
use dczf_core::stats::{CompressionStatsBuilder, StatsTimer};
use dczf_core::{compressor, decompressor, verify};

fn install_logger(args: &CliArgs) {
    let level: log::LevelFilter = args.log_level.into();
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() -> ExitCode {
    let args = match cli_parse::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("dczf: {e}");
            return ExitCode::FAILURE;
        }
    };

    install_logger(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dczf: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> dczf_core::Result<()> {
    let start = Instant::now();
    let mut stats_timer = args.stats.then(StatsTimer::new);

    match &args.command {
        Commands::Compress {
            input,
            output,
            chunk_size_mb,
        } => {
            let chunk_size_bytes = dczf_shared::config::Config::with_chunk_size_mb(*chunk_size_mb)
                .chunk_size_bytes;
            compressor::compress(
                input,
                output,
                chunk_size_bytes,
                None,
                None,
                stats_timer.as_mut(),
            )?;

            if args.stats {
                print_stats("Huffman", input, output, output, true, start, stats_timer);
            }
        }
        Commands::Decompress { input, output } => {
            decompressor::decompress(input, output, None, None, stats_timer.as_mut())?;

            if args.stats {
                print_stats("Huffman", input, output, input, false, start, stats_timer);
            }
        }
        Commands::Verify { compressed } => {
            verify::verify(compressed)?;
            println!("{}: OK", compressed.display());
        }
    }

    Ok(())
}

/// Peeks a container's chunk count for reporting, without decoding any
/// payload bytes. Returns 0 if the header can't be read; stats reporting
/// is best-effort and must never turn a successful run into a failure.
fn count_chunks(compressed_path: &std::path::Path) -> u32 {
    std::fs::File::open(compressed_path)
        .map(std::io::BufReader::new)
        .ok()
        .and_then(|mut r| dczf_core::container::read_header(&mut r).ok())
        .map(|h| h.num_chunks())
        .unwrap_or(0)
}

fn print_stats(
    algorithm_name: &'static str,
    original_path: &std::path::Path,
    processed_path: &std::path::Path,
    compressed_path: &std::path::Path,
    is_compression: bool,
    start: Instant,
    stats_timer: Option<StatsTimer>,
) {
    let original_len = std::fs::metadata(if is_compression {
        original_path
    } else {
        processed_path
    })
    .map(|m| m.len() as usize)
    .unwrap_or(0);
    let processed_len = std::fs::metadata(if is_compression {
        processed_path
    } else {
        original_path
    })
    .map(|m| m.len() as usize)
    .unwrap_or(0);

    let (duration, sections) = stats_timer
        .map(StatsTimer::end)
        .unwrap_or((start.elapsed(), Vec::new()));

    let report = CompressionStatsBuilder::new()
        .algorithm_name(algorithm_name)
        .algorithm_id(1)
        .version_used(dczf_core::container::CURRENT_VERSION as u8)
        .original_len(original_len)
        .processed_len(processed_len)
        .duration(duration)
        .is_compression(is_compression)
        .chunks_processed(count_chunks(compressed_path) as usize)
        .sections(sections)
        .build();

    match report {
        Ok(stats) => println!("{stats}"),
        Err(e) => log::warn!("could not build stats report: {e}"),
    }
}
