//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use stationarity_extractor::prelude::*;
//!
//! let config = ProcessingConfig::new("data/raw", "data/processed");
//! let summary = DatasetPipeline::from_config(config)?.run()?;
//! ```
//!
//! # What's Included
//!
//! ## Pipeline
//! - [`DatasetPipeline`] - Scan, extract, reconcile and export
//! - [`ProcessingConfig`] - Run configuration
//!
//! ## Extraction
//! - [`FileProcessor`] - Streaming per-file extraction
//! - [`extract_chunk_features`] - Features of one in-memory chunk
//! - [`FeatureVector`] - Per-file feature vector
//!
//! ## Batch
//! - [`BatchProcessor`] - Parallel, fault-isolated processing
//! - [`BatchConfig`] - Worker and dispatch settings
//!
//! ## Output
//! - [`Dataset`] - Reconciled matrix and labels
//! - [`DatasetWriter`] - NumPy export

pub use crate::batch::{BatchConfig, BatchOutput, BatchProcessor, ConsoleProgress, ProgressCallback};
pub use crate::config::{LabelMap, ProcessingConfig};
pub use crate::dataset::{align_to_width, Dataset};
pub use crate::error::{ExtractError, Result};
pub use crate::export::DatasetWriter;
pub use crate::features::{extract_chunk_features, ChunkFeatures, FeatureName, FeatureVector};
pub use crate::pipeline::{BuildOutput, DatasetPipeline, RunSummary};
pub use crate::processor::{FileOutcome, FileProcessor};
pub use crate::scanner::{DirectoryScanner, LabelName, LabeledFile, ScanResult};
