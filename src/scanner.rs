//! Labeled file discovery.
//!
//! The input root holds one subdirectory per class. A folder named
//! `stationary` (any casing) is the stationary class; every other folder is
//! non-stationary. Hidden (`.`) and private (`__`) folders are skipped.
//!
//! ```text
//! root/
//! ├── Stationary/        → label 0
//! │   ├── a.csv
//! │   └── nested/b.csv
//! ├── trend/             → label 1
//! │   ├── c.csv
//! │   └── c_metadata.csv (ignored)
//! └── .cache/            (ignored)
//! ```

use crate::config::{LabelMap, ProcessingConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Folder name prefixes that are never scanned.
pub const RESERVED_PREFIXES: &[&str] = &[".", "__"];

/// Substring that marks a file as metadata rather than data.
const METADATA_MARKER: &str = "metadata";

/// Class derived from a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelName {
    Stationary,
    NonStationary,
}

impl LabelName {
    /// Classify a class folder by name.
    pub fn from_folder(name: &str) -> Self {
        if name.eq_ignore_ascii_case("stationary") {
            LabelName::Stationary
        } else {
            LabelName::NonStationary
        }
    }

    /// Key used in label maps and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelName::Stationary => "stationary",
            LabelName::NonStationary => "non_stationary",
        }
    }
}

/// One file to process, with its numeric label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFile {
    pub path: PathBuf,
    pub label: i64,
}

impl LabeledFile {
    pub fn new(path: impl Into<PathBuf>, label: i64) -> Self {
        Self {
            path: path.into(),
            label,
        }
    }
}

/// Files found per class, each list sorted lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub stationary: Vec<PathBuf>,
    pub non_stationary: Vec<PathBuf>,
}

impl ScanResult {
    /// Total number of files across both classes.
    pub fn total(&self) -> usize {
        self.stationary.len() + self.non_stationary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Combined task list: stationary files first, then non-stationary.
    pub fn into_tasks(self, labels: &LabelMap) -> Vec<LabeledFile> {
        let stationary = labels.value(LabelName::Stationary);
        let non_stationary = labels.value(LabelName::NonStationary);
        self.stationary
            .into_iter()
            .map(|p| LabeledFile::new(p, stationary))
            .chain(
                self.non_stationary
                    .into_iter()
                    .map(|p| LabeledFile::new(p, non_stationary)),
            )
            .collect()
    }
}

/// Enumerates labeled files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    extensions: Vec<String>,
    files_per_folder_limit: Option<usize>,
}

impl DirectoryScanner {
    /// Scanner over `root` accepting `.csv` files, no per-folder cap.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: vec!["csv".to_string()],
            files_per_folder_limit: None,
        }
    }

    /// Scanner configured from a run configuration.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(&config.input_dir)
            .with_extensions(config.extensions.iter().cloned())
            .with_limit(config.files_per_folder_limit)
    }

    /// Replace the recognized extensions (leading dots are ignored).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Cap each class folder to its first `limit` files.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.files_per_folder_limit = limit;
        self
    }

    /// Walk the root and collect candidate files per class.
    ///
    /// An empty result is not an error here; callers decide whether it is fatal.
    pub fn scan(&self) -> Result<ScanResult> {
        log::info!("Scanning {} for data files", self.root.display());

        let mut folders: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if RESERVED_PREFIXES.iter().any(|p| name.starts_with(p)) {
                continue;
            }
            // Follows symlinks, so a linked class folder is scanned too
            if entry.path().is_dir() {
                folders.push((name, entry.path()));
            }
        }
        folders.sort();

        let mut result = ScanResult::default();
        for (name, folder) in folders {
            let label = LabelName::from_folder(&name);
            let mut files = self.collect_folder(&folder)?;

            if let Some(limit) = self.files_per_folder_limit {
                if files.len() > limit {
                    log::info!("Taking first {} of {} files from '{}'", limit, files.len(), name);
                    files.truncate(limit);
                }
            }

            match label {
                LabelName::Stationary => result.stationary.extend(files),
                LabelName::NonStationary => result.non_stationary.extend(files),
            }
        }
        result.stationary.sort();
        result.non_stationary.sort();

        log::info!(
            "Found {} stationary and {} non-stationary files",
            result.stationary.len(),
            result.non_stationary.len()
        );
        Ok(result)
    }

    /// Recursively gather accepted files below one class folder, sorted.
    fn collect_folder(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(folder) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Extension recognized and name free of the metadata marker.
    fn accepts(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_ascii_lowercase(),
            None => return false,
        };
        if name.contains(METADATA_MARKER) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}
