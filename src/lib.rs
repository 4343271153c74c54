//! Stationarity Feature Extractor
//!
//! Turns directories of raw time-series files into a fixed-width feature
//! matrix and label vector for a stationarity classifier.
//!
//! # Overview
//!
//! Every file is streamed in bounded chunks, each chunk is summarised by 25
//! statistics (moments, percentiles, differencing, rolling structure,
//! autocorrelation, peaks, zero crossings), and chunk summaries are folded into
//! one vector per file. Files are processed in parallel on a fixed-size worker
//! pool; a broken file is dropped from the dataset without stopping the run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Stationarity Feature Extractor                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  scanner/    - Labeled file discovery                           │
//! │  features/   - Chunk statistics and cross-chunk aggregation     │
//! │  processor/  - Streaming per-file extraction                    │
//! │  batch/      - Bounded worker pool with fault isolation         │
//! │  dataset/    - Width reconciliation                             │
//! │  export/     - NumPy export for Python                          │
//! │  pipeline/   - End-to-end run                                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use stationarity_extractor::prelude::*;
//!
//! let config = ProcessingConfig::new("data/raw", "data/processed").with_workers(8);
//! let summary = DatasetPipeline::from_config(config)?.run()?;
//! println!("{} files accepted, {} failed", summary.files_accepted, summary.files_failed);
//! ```

pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod features;
pub mod pipeline;
pub mod prelude;
pub mod processor;
pub mod scanner;

// Re-exports - Config
pub use config::{LabelMap, ProcessingConfig};

// Re-exports - Errors
pub use error::{ExtractError, Result};

// Re-exports - Discovery
pub use scanner::{DirectoryScanner, LabelName, LabeledFile, ScanResult};

// Re-exports - Features
pub use features::{
    extract_chunk_features, ChunkAggregator, ChunkFeatures, FeatureName, FeatureVector,
    FEATURE_COUNT,
};

// Re-exports - Processing
pub use batch::{BatchConfig, BatchOutput, BatchProcessor, ConsoleProgress, ProgressCallback};
pub use processor::{FileError, FileOutcome, FileProcessor, ProcessedFile};

// Re-exports - Output
pub use dataset::{align_to_width, pad_to_common_width, Dataset};
pub use export::{DatasetWriter, ExportMetadata, ExportedPaths};

// Re-exports - Pipeline
pub use pipeline::{BuildOutput, DatasetPipeline, RunSummary};
