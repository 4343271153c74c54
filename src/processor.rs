//! Streaming per-file processing.
//!
//! Each file is read record by record with a `csv` reader. Values from the
//! data column are buffered until `chunk_size` rows have been read, the chunk
//! is turned into features, and the buffer is reused for the next chunk. Only
//! the running [`ChunkAggregator`] outlives a chunk, so peak memory per file is
//! one chunk regardless of file size.
//!
//! ```text
//! file.csv ──► rows[0..chunk_size) ──► drop missing ──► extract ──┐
//!          ──► rows[chunk_size..)  ──► drop missing ──► extract ──┼──► aggregate ──► FeatureVector
//!          ──► ...                                               ─┘
//! ```
//!
//! [`FileProcessor::process`] never fails: read errors, a missing column or
//! a file without usable chunks become [`FileOutcome::Failed`].

use crate::config::{ProcessingConfig, DEFAULT_CHUNK_SIZE, DEFAULT_DATA_COLUMN};
use crate::error::{ExtractError, Result};
use crate::features::{extract_chunk_features, ChunkAggregator, FeatureVector, MIN_CHUNK_LEN};
use crate::scanner::LabeledFile;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A file that produced a feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub label: i64,
    pub features: FeatureVector,
    pub elapsed: Duration,
}

/// A file excluded from the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub path: PathBuf,
    pub label: i64,
    pub error: String,
}

/// Result of processing one labeled file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Accepted(ProcessedFile),
    Failed(FileError),
}

impl FileOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FileOutcome::Accepted(_))
    }

    /// Path of the file this outcome belongs to.
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Accepted(file) => &file.path,
            FileOutcome::Failed(err) => &err.path,
        }
    }

    /// `(vector, label)` on success, `None` on failure.
    pub fn into_accepted(self) -> Option<(FeatureVector, i64)> {
        match self {
            FileOutcome::Accepted(file) => Some((file.features, file.label)),
            FileOutcome::Failed(_) => None,
        }
    }
}

/// Stateless per-file feature extractor.
///
/// Holds only read-only settings, so one instance is shared by reference
/// across all workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProcessor {
    chunk_size: usize,
    data_column: String,
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl FileProcessor {
    /// Processor reading `chunk_size` rows at a time from the `data` column.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is 0.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Chunk size must be > 0");
        Self {
            chunk_size,
            data_column: DEFAULT_DATA_COLUMN.to_string(),
        }
    }

    /// Processor configured from a run configuration.
    pub fn from_config(config: &ProcessingConfig) -> Result<Self> {
        config.validate().map_err(ExtractError::Config)?;
        Ok(Self::new(config.chunk_size).with_data_column(config.data_column.clone()))
    }

    /// Read the series from a different column.
    pub fn with_data_column(mut self, column: impl Into<String>) -> Self {
        self.data_column = column.into();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn data_column(&self) -> &str {
        &self.data_column
    }

    /// Process one labeled file, converting every error into a failed outcome.
    pub fn process(&self, task: &LabeledFile) -> FileOutcome {
        let start = Instant::now();
        match self.process_file(&task.path) {
            Ok(features) => FileOutcome::Accepted(ProcessedFile {
                path: task.path.clone(),
                label: task.label,
                features,
                elapsed: start.elapsed(),
            }),
            Err(e) => {
                log::warn!("Skipping {}: {}", task.path.display(), e);
                FileOutcome::Failed(FileError {
                    path: task.path.clone(),
                    label: task.label,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Stream one file and return its aggregated feature vector.
    ///
    /// This is the single-file entry point shared with prediction: a file
    /// scored later goes through exactly the same chunking and aggregation.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<FeatureVector> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_for(path))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let column = reader
            .headers()?
            .iter()
            .position(|h| h == self.data_column)
            .ok_or_else(|| ExtractError::MissingColumn {
                column: self.data_column.clone(),
                path: path.to_path_buf(),
            })?;

        let mut record = csv::StringRecord::new();
        let mut chunk: Vec<f64> = Vec::with_capacity(self.chunk_size);
        let mut rows_in_chunk = 0usize;
        let mut chunks_seen = 0usize;
        let mut aggregator = ChunkAggregator::new();

        while reader.read_record(&mut record)? {
            if let Some(value) = record.get(column).and_then(parse_value) {
                chunk.push(value);
            }
            rows_in_chunk += 1;
            if rows_in_chunk == self.chunk_size {
                flush_chunk(&mut chunk, &mut aggregator);
                chunks_seen += 1;
                rows_in_chunk = 0;
            }
        }
        if rows_in_chunk > 0 {
            flush_chunk(&mut chunk, &mut aggregator);
            chunks_seen += 1;
        }

        log::debug!(
            "{}: {} of {} chunks usable",
            path.display(),
            aggregator.count(),
            chunks_seen
        );

        aggregator.finish().ok_or_else(|| ExtractError::NoUsableChunks {
            path: path.to_path_buf(),
        })
    }
}

/// Extract features from a full chunk buffer, then clear it for reuse.
fn flush_chunk(chunk: &mut Vec<f64>, aggregator: &mut ChunkAggregator) {
    if chunk.len() >= MIN_CHUNK_LEN {
        match extract_chunk_features(chunk) {
            Some(features) => aggregator.push(features),
            None => log::debug!("Dropping degenerate chunk of {} values", chunk.len()),
        }
    }
    chunk.clear();
}

/// Parse one cell; empty, non-numeric and NaN cells count as missing.
fn parse_value(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Tab for `.tsv`, comma otherwise.
fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}
