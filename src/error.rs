//! Error types for dataset extraction.
//!
//! Chunk-level problems never reach this type: the extractor reports them as
//! `None`. File-level errors are produced by [`FileProcessor::process_file`]
//! and are turned into failed outcomes by the batch layer. Only batch-level
//! (`NoData`) and persistence-level errors terminate a run.
//!
//! [`FileProcessor::process_file`]: crate::processor::FileProcessor::process_file

use std::path::PathBuf;

/// Errors raised while scanning, processing or exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Filesystem error (unreadable input, unwritable output directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed tabular input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Directory traversal failure.
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The designated data column is absent from the file header.
    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    /// Every chunk of the file was empty or degenerate.
    #[error("no usable chunks in {}", path.display())]
    NoUsableChunks { path: PathBuf },

    /// Nothing to build a dataset from.
    #[error("no data: {0}")]
    NoData(String),

    /// A row is wider than the width it must be aligned to.
    #[error("feature row has {actual} values, expected at most {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    /// Array construction failure.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// `.npy` serialization failure.
    #[error("failed to write npy: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    /// Metadata serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ExtractError>;
