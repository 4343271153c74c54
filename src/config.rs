//! Run configuration management.
//!
//! A single serializable struct drives the whole extraction run: where to
//! scan, how large each streamed chunk is, how many workers to use and where
//! the dataset is written. Configurations can be saved to and loaded from TOML
//! or JSON for reproducible runs.
//!
//! # Example
//!
//! ```ignore
//! use stationarity_extractor::config::ProcessingConfig;
//!
//! let config = ProcessingConfig::new("data/raw", "data/processed")
//!     .with_chunk_size(5_000)
//!     .with_workers(8);
//!
//! config.save_toml("run.toml")?;
//! let loaded = ProcessingConfig::load_toml("run.toml")?;
//! ```

use crate::scanner::LabelName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of rows per streamed read.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default worker pool size.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default number of tasks handed to a worker per dispatch.
pub const DEFAULT_DISPATCH_BATCH_SIZE: usize = 100;

/// Default name of the column holding the series.
pub const DEFAULT_DATA_COLUMN: &str = "data";

/// Numeric label assigned to each folder class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    /// Label for folders named "stationary" (any casing)
    pub stationary: i64,

    /// Label for every other folder
    pub non_stationary: i64,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self {
            stationary: 0,
            non_stationary: 1,
        }
    }
}

impl LabelMap {
    /// Numeric label for a label class.
    pub fn value(&self, name: LabelName) -> i64 {
        match name {
            LabelName::Stationary => self.stationary,
            LabelName::NonStationary => self.non_stationary,
        }
    }

    /// Reverse lookup; names the label classes in exported metadata.
    pub fn name_of(&self, value: i64) -> Option<LabelName> {
        if value == self.stationary {
            Some(LabelName::Stationary)
        } else if value == self.non_stationary {
            Some(LabelName::NonStationary)
        } else {
            None
        }
    }
}

/// Unified run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Root directory containing one subdirectory per class
    pub input_dir: PathBuf,

    /// Directory receiving `features.npy`, `labels.npy` and `metadata.json`
    pub output_dir: PathBuf,

    /// Rows per streamed read
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Optional cap on files taken from each class folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_per_folder_limit: Option<usize>,

    /// Folder class to numeric label mapping
    #[serde(default)]
    pub label_map: LabelMap,

    /// Worker pool size, fixed for the run
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Tasks handed to a worker per dispatch
    #[serde(default = "default_dispatch_batch_size")]
    pub dispatch_batch_size: usize,

    /// Column holding the numeric series
    #[serde(default = "default_data_column")]
    pub data_column: String,

    /// Recognized file extensions (case-insensitive, without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_dispatch_batch_size() -> usize {
    DEFAULT_DISPATCH_BATCH_SIZE
}

fn default_data_column() -> String {
    DEFAULT_DATA_COLUMN.to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("processed"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            files_per_folder_limit: None,
            label_map: LabelMap::default(),
            worker_count: DEFAULT_WORKER_COUNT,
            dispatch_batch_size: DEFAULT_DISPATCH_BATCH_SIZE,
            data_column: default_data_column(),
            extensions: default_extensions(),
        }
    }
}

impl ProcessingConfig {
    /// Create a configuration with default tuning for the given directories.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(input_dir: P, output_dir: Q) -> Self {
        Self {
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set rows per streamed read.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Cap the number of files taken from each class folder.
    pub fn with_files_per_folder_limit(mut self, limit: usize) -> Self {
        self.files_per_folder_limit = Some(limit);
        self
    }

    /// Set the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Set the dispatch batch size.
    pub fn with_dispatch_batch_size(mut self, batch_size: usize) -> Self {
        self.dispatch_batch_size = batch_size;
        self
    }

    /// Set the data column name.
    pub fn with_data_column(mut self, column: impl Into<String>) -> Self {
        self.data_column = column.into();
        self
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be > 0".to_string());
        }
        if self.dispatch_batch_size == 0 {
            return Err("dispatch_batch_size must be > 0".to_string());
        }
        if self.data_column.trim().is_empty() {
            return Err("data_column must not be empty".to_string());
        }
        if self.extensions.is_empty() {
            return Err("at least one file extension is required".to_string());
        }
        if self.extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            return Err("file extensions must not be empty".to_string());
        }
        if self.label_map.stationary == self.label_map.non_stationary {
            return Err(format!(
                "label_map values must differ (both are {})",
                self.label_map.stationary
            ));
        }
        Ok(())
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: ProcessingConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load configuration from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: ProcessingConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML or JSON, chosen by file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let is_json = path
            .as_ref()
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::load_json(path)
        } else {
            Self::load_toml(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ProcessingConfig::default();
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.dispatch_batch_size, 100);
        assert_eq!(config.files_per_folder_limit, None);
        assert_eq!(config.label_map, LabelMap { stationary: 0, non_stationary: 1 });
        assert_eq!(config.data_column, "data");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        assert!(ProcessingConfig::default().with_chunk_size(0).validate().is_err());
        assert!(ProcessingConfig::default().with_workers(0).validate().is_err());
        assert!(ProcessingConfig::default()
            .with_dispatch_batch_size(0)
            .validate()
            .is_err());
        assert!(ProcessingConfig::default().with_data_column(" ").validate().is_err());
    }

    #[test]
    fn test_validation_rejects_colliding_labels() {
        let mut config = ProcessingConfig::default();
        config.label_map.non_stationary = 0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("must differ"));
    }

    #[test]
    fn test_toml_round_trip_and_partial_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.toml");

        let config = ProcessingConfig::new("in", "out")
            .with_chunk_size(500)
            .with_files_per_folder_limit(3);
        config.save_toml(&path).unwrap();
        assert_eq!(ProcessingConfig::load(&path).unwrap(), config);

        // Omitted fields fall back to defaults
        let minimal = dir.path().join("minimal.toml");
        fs::write(&minimal, "input_dir = \"a\"\noutput_dir = \"b\"\n").unwrap();
        let loaded = ProcessingConfig::load_toml(&minimal).unwrap();
        assert_eq!(loaded.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(loaded.extensions, vec!["csv".to_string()]);
    }

    #[test]
    fn test_json_load_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"input_dir": "a", "output_dir": "b", "worker_count": 0}"#,
        )
        .unwrap();
        assert!(ProcessingConfig::load(&path).is_err());
    }

    #[test]
    fn test_label_map_lookup() {
        let map = LabelMap::default();
        assert_eq!(map.value(LabelName::Stationary), 0);
        assert_eq!(map.value(LabelName::NonStationary), 1);
        assert_eq!(map.name_of(1), Some(LabelName::NonStationary));
        assert_eq!(map.name_of(7), None);
    }
}
