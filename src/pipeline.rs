//! End-to-end dataset build.
//!
//! Connects the stages for one run:
//!
//! ```text
//! DirectoryScanner → [LabeledFile] → BatchProcessor → BatchOutput
//!                                                      ↓ pad to common width
//!                                                   Dataset → DatasetWriter
//! ```
//!
//! Two conditions end a run with an error: finding no files at all, and no
//! file producing a feature vector. Export failures are surfaced as well.
//! Everything file-specific is recovered inside the batch.
//!
//! # Example
//!
//! ```ignore
//! use stationarity_extractor::prelude::*;
//!
//! let config = ProcessingConfig::load_toml("run.toml")?;
//! let summary = DatasetPipeline::from_config(config)?.run()?;
//! println!("{} rows × {} columns", summary.n_samples, summary.n_features);
//! ```

use crate::batch::{BatchProcessor, ProgressCallback};
use crate::config::ProcessingConfig;
use crate::dataset::Dataset;
use crate::error::{ExtractError, Result};
use crate::export::{DatasetWriter, ExportedPaths};
use crate::scanner::DirectoryScanner;
use std::time::{Duration, Instant};

/// In-memory result of [`DatasetPipeline::build`].
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Reconciled matrix and labels
    pub dataset: Dataset,

    /// Files handed to the worker pool
    pub files_dispatched: usize,

    /// Files excluded after failing
    pub files_failed: usize,
}

impl BuildOutput {
    /// Files that became dataset rows.
    pub fn files_accepted(&self) -> usize {
        self.files_dispatched - self.files_failed
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Files found by the scanner
    pub files_found: usize,

    /// Files that became dataset rows
    pub files_accepted: usize,

    /// Files excluded after failing
    pub files_failed: usize,

    pub n_samples: usize,
    pub n_features: usize,

    /// Artifact locations
    pub paths: ExportedPaths,

    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

/// Scan, extract, reconcile and export in one call.
pub struct DatasetPipeline {
    config: ProcessingConfig,
    batch: BatchProcessor,
}

impl DatasetPipeline {
    /// Create pipeline from configuration
    pub fn from_config(config: ProcessingConfig) -> Result<Self> {
        let batch = BatchProcessor::from_config(&config)?;
        Ok(Self { config, batch })
    }

    /// Report per-file progress through `callback`.
    pub fn with_progress_callback(mut self, callback: Box<dyn ProgressCallback>) -> Self {
        self.batch = self.batch.with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Build the dataset in memory without writing it.
    pub fn build(&self) -> Result<BuildOutput> {
        let scan = DirectoryScanner::from_config(&self.config).scan()?;
        if scan.is_empty() {
            return Err(ExtractError::NoData(format!(
                "no data files found under {}",
                self.config.input_dir.display()
            )));
        }

        let tasks = scan.into_tasks(&self.config.label_map);
        let output = self.batch.process_files(&tasks)?;
        let files_dispatched = output.total_count();
        let files_failed = output.failed_count();
        let dataset = output.into_dataset()?;
        Ok(BuildOutput {
            dataset,
            files_dispatched,
            files_failed,
        })
    }

    /// Run the full pipeline and write the artifacts.
    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let built = self.build()?;
        let dataset = &built.dataset;

        let writer =
            DatasetWriter::new(&self.config.output_dir).with_label_map(self.config.label_map);
        let metadata = writer.metadata_for(dataset).with_run_stats(
            built.files_dispatched,
            built.files_failed,
            self.config.chunk_size,
        );
        let paths = writer.write_with_metadata(dataset, metadata)?;

        Ok(RunSummary {
            files_found: built.files_dispatched,
            files_accepted: built.files_accepted(),
            files_failed: built.files_failed,
            n_samples: dataset.n_samples(),
            n_features: dataset.n_features(),
            paths,
            elapsed: start.elapsed(),
        })
    }
}
