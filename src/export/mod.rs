//! Dataset export.
//!
//! Writes the reconciled dataset as NumPy arrays for the Python training and
//! prediction side:
//!
//! - `features.npy`: `[n_samples, n_features]` float64 matrix
//! - `labels.npy`: `[n_samples]` int64 vector
//! - `metadata.json`: shapes, column names and run statistics
//!
//! # Example
//!
//! ```ignore
//! use stationarity_extractor::export::DatasetWriter;
//!
//! let writer = DatasetWriter::new("data/processed");
//! let written = writer.write(&dataset)?;
//! println!("{:?}", written.features_path);
//! ```

use crate::config::LabelMap;
use crate::dataset::Dataset;
use crate::error::Result;
use ndarray::{Array1, Array2};
use ndarray_npy::WriteNpyExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the feature matrix.
pub const FEATURES_FILE: &str = "features.npy";

/// File name of the label vector.
pub const LABELS_FILE: &str = "labels.npy";

/// File name of the metadata document.
pub const METADATA_FILE: &str = "metadata.json";

/// Metadata about an exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Number of rows (accepted files)
    pub n_samples: usize,

    /// Number of columns after reconciliation
    pub n_features: usize,

    /// Column names, when the width matches a known schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    /// Samples per label class, keyed by class name (`stationary`,
    /// `non_stationary`); values outside the label map keep their number
    pub label_distribution: BTreeMap<String, usize>,

    /// Rows right-padded with zeros during reconciliation
    pub padded_rows: usize,

    /// Files dispatched, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_dispatched: Option<usize>,

    /// Files excluded, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_failed: Option<usize>,

    /// Rows per streamed read, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    /// Export timestamp (RFC 3339)
    pub export_timestamp: String,
}

impl ExportMetadata {
    /// Metadata describing a dataset, without run statistics.
    pub fn for_dataset(dataset: &Dataset, labels: &LabelMap) -> Self {
        Self {
            n_samples: dataset.n_samples(),
            n_features: dataset.n_features(),
            feature_names: dataset.feature_names.clone(),
            label_distribution: dataset
                .label_distribution()
                .into_iter()
                .map(|(label, count)| {
                    let key = match labels.name_of(label) {
                        Some(name) => name.as_str().to_string(),
                        None => label.to_string(),
                    };
                    (key, count)
                })
                .collect(),
            padded_rows: dataset.padded_rows,
            files_dispatched: None,
            files_failed: None,
            chunk_size: None,
            export_timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Attach run statistics.
    pub fn with_run_stats(mut self, dispatched: usize, failed: usize, chunk_size: usize) -> Self {
        self.files_dispatched = Some(dispatched);
        self.files_failed = Some(failed);
        self.chunk_size = Some(chunk_size);
        self
    }
}

/// Paths written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPaths {
    pub features_path: PathBuf,
    pub labels_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Writes datasets to `.npy` files in one directory.
pub struct DatasetWriter {
    output_dir: PathBuf,
    label_map: LabelMap,
}

impl DatasetWriter {
    /// Create a writer targeting `output_dir` (created on first write).
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            label_map: LabelMap::default(),
        }
    }

    /// Name label classes in metadata using `labels`.
    pub fn with_label_map(mut self, labels: LabelMap) -> Self {
        self.label_map = labels;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Metadata for `dataset`, naming label classes with this writer's map.
    pub fn metadata_for(&self, dataset: &Dataset) -> ExportMetadata {
        ExportMetadata::for_dataset(dataset, &self.label_map)
    }

    /// Write a dataset with default metadata.
    pub fn write(&self, dataset: &Dataset) -> Result<ExportedPaths> {
        self.write_with_metadata(dataset, self.metadata_for(dataset))
    }

    /// Write a dataset and the given metadata.
    ///
    /// All three artifacts are first written under hidden staging names and
    /// only renamed into place once every write has succeeded. A failed
    /// write removes the staged files and leaves existing artifacts alone.
    pub fn write_with_metadata(
        &self,
        dataset: &Dataset,
        metadata: ExportMetadata,
    ) -> Result<ExportedPaths> {
        fs::create_dir_all(&self.output_dir)?;

        let staged_features = self.staging_path(FEATURES_FILE);
        let staged_labels = self.staging_path(LABELS_FILE);
        let staged_metadata = self.staging_path(METADATA_FILE);

        let written = export_features(&dataset.features, &staged_features)
            .and_then(|_| export_labels(&dataset.labels, &staged_labels))
            .and_then(|_| export_metadata(&metadata, &staged_metadata));
        if let Err(e) = written {
            for staged in [&staged_features, &staged_labels, &staged_metadata] {
                // May not exist if the failure came first
                let _ = fs::remove_file(staged);
            }
            return Err(e);
        }

        let features_path = self.commit(&staged_features, FEATURES_FILE)?;
        let labels_path = self.commit(&staged_labels, LABELS_FILE)?;
        let metadata_path = self.commit(&staged_metadata, METADATA_FILE)?;

        log::info!("Saved processed data to {}", self.output_dir.display());
        log::info!("Features shape: {:?}", dataset.features.shape());
        log::info!("Labels shape: {:?}", dataset.labels.shape());

        Ok(ExportedPaths {
            features_path,
            labels_path,
            metadata_path,
        })
    }

    /// Hidden sibling that an artifact is written to before the rename.
    fn staging_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!(".{name}.tmp"))
    }

    /// Move a staged artifact to its final name.
    fn commit(&self, staged: &Path, name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        fs::rename(staged, &path)?;
        Ok(path)
    }
}

/// Export features as 2D NumPy array
fn export_features(features: &Array2<f64>, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    features.write_npy(&mut writer)?;
    writer.flush()?;
    log::debug!(
        "Exported features: {} [{} samples × {} features]",
        path.display(),
        features.nrows(),
        features.ncols()
    );
    Ok(())
}

/// Export labels as 1D NumPy array
fn export_labels(labels: &Array1<i64>, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    labels.write_npy(&mut writer)?;
    writer.flush()?;
    log::debug!("Exported labels: {} [{} samples]", path.display(), labels.len());
    Ok(())
}

/// Export metadata as JSON
fn export_metadata(metadata: &ExportMetadata, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, metadata)?;
    writer.flush()?;
    Ok(())
}
