//! # Performance and Stats Utility Module
//!
//! Precision timing and human-readable reporting for a single compress or
//! decompress run: total duration, per-phase sections, throughput, and
//! (since runs here are chunked) the number of chunks processed.
//!
//! Adapted from a single-shot byte-in/byte-out stats module: the chunk
//! count and per-chunk average are new here, everything else keeps the
//! same builder/timer shape.
use std::error::Error;
use std::fmt::{self, Display};
use std::time::{Duration, Instant};

const KIB: usize = 1024;
const MIB: usize = KIB * 1024;
const GIB: usize = MIB * 1024;
const TIB: usize = GIB * 1024;

/// Formats a raw byte count using binary prefixes (KiB, MiB, GiB, TiB).
fn format_bytes(bytes: usize) -> String {
    if bytes >= TIB {
        format!("{:.2} TiB", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} Bytes", bytes)
    }
}

/// A custom error type for failures constructing a [`CompressionStats`]
/// via the builder.
#[derive(Debug)]
pub enum BuilderError {
    /// A mandatory field was never set. Carries the field's name.
    MissingField(&'static str),
}

impl Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::MissingField(field) => {
                write!(f, "Builder Error: Missing required field '{}'", field)
            }
        }
    }
}

impl Error for BuilderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

/// Statistics for a single compression or decompression run.
#[derive(Debug, Clone)]
pub struct CompressionStats {
    pub algorithm_name: &'static str,
    pub algorithm_id: u8,
    pub version_used: u8,
    /// Pre-processing length in bytes (uncompressed for compression,
    /// compressed for decompression).
    pub original_len: usize,
    /// Post-processing length in bytes.
    pub processed_len: usize,
    pub duration: Duration,
    pub is_compression: bool,
    /// Number of chunks the run was split into.
    pub chunks_processed: usize,
    pub sections: Vec<SectionStats>,

    pub compression_ratio_factor: f64,
    pub speed_mib_s: f64,
    pub raw_byte_difference: i64,
    pub percentage_change: f64,
}

/// Name and duration of one timed step within a run (e.g. "Histogram",
/// "Canonical codes", "Header write").
#[derive(Debug, Clone)]
pub struct SectionStats {
    pub name: String,
    pub duration: Duration,
}

impl SectionStats {
    pub fn new(name: &str, duration: Duration) -> Self {
        SectionStats {
            name: name.to_string(),
            duration,
        }
    }
}

impl Display for SectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<30} {:.3} seconds",
            self.name,
            self.duration.as_secs_f64()
        )
    }
}

/// Measures the duration of a single section; consumes itself on `end()`
/// so a section cannot be timed twice.
pub struct SubSectionTimer {
    start_time: Instant,
    section_name: String,
}

impl SubSectionTimer {
    pub fn new(name: &str) -> Self {
        SubSectionTimer {
            start_time: Instant::now(),
            section_name: name.to_string(),
        }
    }

    pub fn end(self) -> SectionStats {
        let duration = self.start_time.elapsed();
        SectionStats::new(&self.section_name, duration)
    }
}

/// Overall run timer, aggregating the `SectionStats` of its sub-sections.
pub struct StatsTimer {
    start_time: Instant,
    sections: Vec<SectionStats>,
}

impl StatsTimer {
    pub fn new() -> Self {
        StatsTimer {
            start_time: Instant::now(),
            sections: Vec::new(),
        }
    }

    pub fn start_section(&mut self, name: &str) -> SubSectionTimer {
        SubSectionTimer::new(name)
    }

    pub fn add_section(&mut self, section_stats: SectionStats) {
        self.sections.push(section_stats);
    }

    pub fn end(self) -> (Duration, Vec<SectionStats>) {
        (self.start_time.elapsed(), self.sections)
    }
}

impl Default for StatsTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-cost when disabled: wraps an optional [`StatsTimer`] so the core
/// can take `Option<&mut StatsTimer>` at call sites without branching on
/// "is stats enabled" everywhere.
pub struct OptinalStatsTimer(Option<StatsTimer>);

impl OptinalStatsTimer {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            OptinalStatsTimer(Some(StatsTimer::new()))
        } else {
            OptinalStatsTimer(None)
        }
    }

    pub fn start_section(&mut self, name: &str) -> Option<SubSectionTimer> {
        self.0.as_mut().map(|t| t.start_section(name))
    }

    pub fn add_section(&mut self, timer: Option<SubSectionTimer>) {
        if let Some(sub_timer) = timer {
            if let Some(main_t) = self.0.as_mut() {
                main_t.add_section(sub_timer.end());
            }
        }
    }

    pub fn end(self) -> (Duration, Vec<SectionStats>) {
        self.0
            .map_or((Duration::from_secs(0), Vec::new()), |t| t.end())
    }
}

/// Builder for [`CompressionStats`].
#[derive(Default)]
pub struct CompressionStatsBuilder {
    algorithm_name: Option<&'static str>,
    algorithm_id: Option<u8>,
    version_used: Option<u8>,
    original_len: Option<usize>,
    processed_len: Option<usize>,
    duration: Option<Duration>,
    is_compression: Option<bool>,
    chunks_processed: usize,
    sections: Vec<SectionStats>,
}

impl CompressionStats {
    #[allow(clippy::too_many_arguments)]
    fn calculate_stats(
        algorithm_name: &'static str,
        algorithm_id: u8,
        version_used: u8,
        original_len: usize,
        processed_len: usize,
        duration: Duration,
        is_compression: bool,
        chunks_processed: usize,
        sections: Vec<SectionStats>,
    ) -> Self {
        let (uncompressed_len, compressed_len) = if is_compression {
            (original_len, processed_len)
        } else {
            (processed_len, original_len)
        };

        let compression_ratio_factor = if compressed_len == 0 {
            0.0
        } else {
            uncompressed_len as f64 / compressed_len as f64
        };

        let duration_secs = duration.as_secs_f64();
        let speed_mib_s = if duration_secs == 0.0 {
            f64::INFINITY
        } else {
            (uncompressed_len as f64 / (1024.0 * 1024.0)) / duration_secs
        };

        let raw_byte_difference = uncompressed_len as i64 - compressed_len as i64;
        let difference_bytes = raw_byte_difference.unsigned_abs() as usize;
        let percentage_base = uncompressed_len as f64;
        let percentage_change = if percentage_base == 0.0 {
            0.0
        } else {
            (difference_bytes as f64 / percentage_base) * 100.0
        };

        CompressionStats {
            algorithm_name,
            algorithm_id,
            version_used,
            original_len,
            processed_len,
            duration,
            is_compression,
            chunks_processed,
            sections,
            compression_ratio_factor,
            speed_mib_s,
            raw_byte_difference,
            percentage_change,
        }
    }
}

impl CompressionStatsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm_name(mut self, name: &'static str) -> Self {
        self.algorithm_name = Some(name);
        self
    }
    pub fn algorithm_id(mut self, id: u8) -> Self {
        self.algorithm_id = Some(id);
        self
    }
    pub fn version_used(mut self, version: u8) -> Self {
        self.version_used = Some(version);
        self
    }
    pub fn original_len(mut self, len: usize) -> Self {
        self.original_len = Some(len);
        self
    }
    pub fn processed_len(mut self, len: usize) -> Self {
        self.processed_len = Some(len);
        self
    }
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
    pub fn is_compression(mut self, is_comp: bool) -> Self {
        self.is_compression = Some(is_comp);
        self
    }
    pub fn chunks_processed(mut self, count: usize) -> Self {
        self.chunks_processed = count;
        self
    }
    pub fn sections(mut self, sections: Vec<SectionStats>) -> Self {
        self.sections = sections;
        self
    }

    pub fn build(self) -> Result<CompressionStats, BuilderError> {
        let name = self
            .algorithm_name
            .ok_or(BuilderError::MissingField("algorithm_name"))?;
        let id = self
            .algorithm_id
            .ok_or(BuilderError::MissingField("algorithm_id"))?;
        let version = self
            .version_used
            .ok_or(BuilderError::MissingField("version_used"))?;
        let original = self
            .original_len
            .ok_or(BuilderError::MissingField("original_len"))?;
        let processed = self
            .processed_len
            .ok_or(BuilderError::MissingField("processed_len"))?;
        let duration = self
            .duration
            .ok_or(BuilderError::MissingField("duration"))?;
        let is_comp = self
            .is_compression
            .ok_or(BuilderError::MissingField("is_compression"))?;

        Ok(CompressionStats::calculate_stats(
            name,
            id,
            version,
            original,
            processed,
            duration,
            is_comp,
            self.chunks_processed,
            self.sections,
        ))
    }
}

impl Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (uncompressed_len, compressed_len) = if self.is_compression {
            (self.original_len, self.processed_len)
        } else {
            (self.processed_len, self.original_len)
        };
        let title_name = if self.is_compression {
            "Compression"
        } else {
            "Decompression"
        };
        let speed_name = if self.is_compression {
            "Compression Speed"
        } else {
            "Decompression Speed"
        };
        let raw_byte_difference_abs = self.raw_byte_difference.unsigned_abs() as usize;
        let (savings_label, bytes_label) = if compressed_len < uncompressed_len {
            (
                format!("Compression Savings :  {:.2}(%)", self.percentage_change),
                "Space Saved:".to_string(),
            )
        } else if compressed_len > uncompressed_len {
            (
                format!("File Bloat :          {:.2}(%)", self.percentage_change),
                "Space Wasted:".to_string(),
            )
        } else {
            (
                "File Size Change :    0.00% (No Change)".to_string(),
                "Bytes Difference:".to_string(),
            )
        };

        writeln!(f, "\n--- {} Statistics ---", title_name)?;
        writeln!(f, "    Algorithm name:       {}", self.algorithm_name)?;
        writeln!(f, "    Algorithm ID:           {}", self.algorithm_id)?;
        writeln!(f, "    Version Used:         {}", self.version_used)?;
        writeln!(f, "    Chunks Processed:     {}", self.chunks_processed)?;
        writeln!(
            f,
            "    Original Size:        {}",
            format_bytes(uncompressed_len)
        )?;
        writeln!(
            f,
            "    Processed Size:      {}",
            format_bytes(compressed_len)
        )?;
        writeln!(
            f,
            "    Bytes Difference:     {} ({})",
            self.raw_byte_difference,
            format_bytes(raw_byte_difference_abs)
        )?;
        writeln!(
            f,
            "    Compression Ratio:    {:.3}:1 (Original / Processed)",
            self.compression_ratio_factor
        )?;
        writeln!(
            f,
            "    {:<21} {}",
            bytes_label,
            format_bytes(raw_byte_difference_abs)
        )?;
        writeln!(f, "    {}", savings_label)?;
        writeln!(
            f,
            "    Processing Time:      {:.3} seconds",
            self.duration.as_secs_f64()
        )?;
        write!(f, "    {:<21} {:.2} MiB/s", speed_name, self.speed_mib_s)?;

        writeln!(f, "\n\n--- Detailed Processing Steps ---")?;
        if self.sections.is_empty() {
            writeln!(f, "    (No detailed sections recorded)")?;
        } else {
            for section in &self.sections {
                writeln!(f, "    - {}", section)?;
            }
        }

        Ok(())
    }
}
