//! Tests for parallel batch processing.
//!
//! These tests verify:
//! 1. Results do not depend on the worker count or dispatch batch size
//! 2. Failures stay confined to the file that caused them
//! 3. Progress reporting is accurate
//!
//! Run with: cargo test --test parallel_processing_tests

use stationarity_extractor::batch::{
    process_files_parallel, process_files_with_threads, BatchConfig, BatchOutput, BatchProcessor,
    ProgressCallback, ProgressInfo,
};
use stationarity_extractor::prelude::*;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

fn write_series(path: &Path, values: &[f64]) {
    let mut file = File::create(path).unwrap();
    writeln!(file, "data").unwrap();
    for v in values {
        writeln!(file, "{v}").unwrap();
    }
}

/// `count` files of varying length and shape, alternating labels.
fn create_tasks(dir: &Path, count: usize) -> Vec<LabeledFile> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("series_{i:03}.csv"));
            let rows = 40 + (i * 37) % 300;
            let values: Vec<f64> = (0..rows)
                .map(|t| {
                    let t = t as f64;
                    (t * (0.1 + i as f64 * 0.05)).sin() + t * (i % 3) as f64 * 0.02
                })
                .collect();
            write_series(&path, &values);
            LabeledFile::new(path, (i % 2) as i64)
        })
        .collect()
}

fn processor() -> FileProcessor {
    FileProcessor::new(64)
}

/// Accepted results keyed by path, for order-independent comparison.
fn sorted_results(output: &BatchOutput) -> Vec<(PathBuf, Vec<f64>, i64)> {
    let mut rows: Vec<_> = output
        .iter()
        .map(|r| (r.path.clone(), r.features.to_vec(), r.label))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_batch_processor_creation() {
    let batch = BatchProcessor::new(processor(), BatchConfig::new().with_threads(3));
    assert_eq!(batch.batch_config().num_threads, 3);
    assert_eq!(batch.processor().chunk_size(), 64);
}

#[test]
fn test_empty_task_list() {
    let output = process_files_parallel(&processor(), &[]).unwrap();
    assert_eq!(output.total_count(), 0);
    assert!(output.all_successful());
    assert!(matches!(output.into_dataset(), Err(ExtractError::NoData(_))));
}

#[test]
fn test_every_task_yields_one_outcome() {
    let dir = TempDir::new().unwrap();
    let tasks = create_tasks(dir.path(), 23);

    let output = process_files_with_threads(&processor(), &tasks, 4).unwrap();
    assert_eq!(output.total_count(), 23);
    assert_eq!(output.successful_count(), 23);

    let seen: HashSet<_> = output.iter().map(|r| r.path.clone()).collect();
    let expected: HashSet<_> = tasks.iter().map(|t| t.path.clone()).collect();
    assert_eq!(seen, expected);
}

// ============================================================================
// Determinism Tests
// ============================================================================

#[test]
fn test_worker_count_does_not_change_results() {
    let dir = TempDir::new().unwrap();
    let tasks = create_tasks(dir.path(), 17);

    let sequential = process_files_with_threads(&processor(), &tasks, 1).unwrap();
    let parallel = process_files_with_threads(&processor(), &tasks, 4).unwrap();

    assert_eq!(sequential.threads_used, 1);
    assert_eq!(parallel.threads_used, 4);
    assert_eq!(sorted_results(&sequential), sorted_results(&parallel));
}

#[test]
fn test_dispatch_batch_size_does_not_change_results() {
    let dir = TempDir::new().unwrap();
    let tasks = create_tasks(dir.path(), 12);

    let one = BatchProcessor::new(
        processor(),
        BatchConfig::new().with_threads(3).with_dispatch_batch_size(1),
    )
    .process_files(&tasks)
    .unwrap();
    let many = BatchProcessor::new(
        processor(),
        BatchConfig::new().with_threads(3).with_dispatch_batch_size(100),
    )
    .process_files(&tasks)
    .unwrap();

    assert_eq!(sorted_results(&one), sorted_results(&many));
}

#[test]
fn test_parallel_matches_direct_processing() {
    let dir = TempDir::new().unwrap();
    let tasks = create_tasks(dir.path(), 8);
    let fp = processor();

    let output = process_files_with_threads(&fp, &tasks, 4).unwrap();
    for result in output.iter() {
        let direct = fp.process_file(&result.path).unwrap();
        assert_eq!(result.features, direct);
    }
}

#[test]
fn test_dataset_rows_are_label_aligned() {
    let dir = TempDir::new().unwrap();
    let tasks = create_tasks(dir.path(), 10);

    let output = process_files_with_threads(&processor(), &tasks, 4).unwrap();
    let expected: Vec<(Vec<f64>, i64)> = output
        .iter()
        .map(|r| (r.features.to_vec(), r.label))
        .collect();
    let dataset = output.into_dataset().unwrap();

    assert_eq!(dataset.n_samples(), 10);
    for (i, (row, label)) in expected.iter().enumerate() {
        assert_eq!(dataset.labels[i], *label);
        assert_eq!(&dataset.features.row(i).to_vec()[..row.len()], row.as_slice());
    }
}

// ============================================================================
// Fault Isolation Tests
// ============================================================================

#[test]
fn test_failures_are_isolated() {
    let dir = TempDir::new().unwrap();
    let mut tasks = create_tasks(dir.path(), 9);

    let missing = dir.path().join("missing.csv");
    tasks.insert(3, LabeledFile::new(&missing, 1));

    let wrong_column = dir.path().join("wrong_column.csv");
    fs::write(&wrong_column, "price\n1\n2\n3\n").unwrap();
    tasks.push(LabeledFile::new(&wrong_column, 0));

    let output = process_files_with_threads(&processor(), &tasks, 3).unwrap();

    assert_eq!(output.total_count(), 11);
    assert_eq!(output.successful_count(), 9);
    assert_eq!(output.failed_count(), 2);
    assert!(!output.all_successful());

    let failed: HashSet<_> = output.iter_errors().map(|e| e.path.clone()).collect();
    assert!(failed.contains(&missing));
    assert!(failed.contains(&wrong_column));
    assert!(output
        .iter_errors()
        .all(|e| !e.error.is_empty()));

    let dataset = output.into_dataset().unwrap();
    assert_eq!(dataset.n_samples(), 9);
}

#[test]
fn test_all_failures_is_no_data() {
    let dir = TempDir::new().unwrap();
    let tasks: Vec<_> = (0..4)
        .map(|i| LabeledFile::new(dir.path().join(format!("absent_{i}.csv")), 0))
        .collect();

    let output = process_files_with_threads(&processor(), &tasks, 2).unwrap();
    assert_eq!(output.failed_count(), 4);
    assert!(matches!(output.into_dataset(), Err(ExtractError::NoData(_))));
}

// ============================================================================
// Progress Reporting Tests
// ============================================================================

struct CountingProgress {
    calls: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<ProgressInfo>>>,
    completed: Arc<AtomicUsize>,
}

impl ProgressCallback for CountingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(info.clone());
    }

    fn on_complete(&self, _output: &BatchOutput) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_reports_every_file() {
    let dir = TempDir::new().unwrap();
    let mut tasks = create_tasks(dir.path(), 6);
    tasks.push(LabeledFile::new(dir.path().join("gone.csv"), 1));

    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(None));
    let completed = Arc::new(AtomicUsize::new(0));

    let batch = BatchProcessor::new(processor(), BatchConfig::new().with_threads(2))
        .with_progress_callback(Box::new(CountingProgress {
            calls: Arc::clone(&calls),
            last: Arc::clone(&last),
            completed: Arc::clone(&completed),
        }));
    batch.process_files(&tasks).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 7);
    assert_eq!(completed.load(Ordering::SeqCst), 1);

    let info = last.lock().unwrap().clone().unwrap();
    assert_eq!(info.total_files, 7);
    assert_eq!(info.completed, 6);
    assert_eq!(info.failed, 1);
    assert!((info.percent_complete() - 100.0).abs() < 1e-9);
    assert_eq!(info.estimated_remaining(), Some(std::time::Duration::ZERO));
}

// ============================================================================
// Pipeline Integration
// ============================================================================

#[test]
fn test_pipeline_worker_counts_agree() {
    let input = TempDir::new().unwrap();
    for (folder, offset) in [("stationary", 0usize), ("non_stationary", 5)] {
        let dir = input.path().join(folder);
        fs::create_dir_all(&dir).unwrap();
        for task in create_tasks(&dir, 5) {
            let renamed = dir.join(format!(
                "f{}_{}",
                offset,
                task.path.file_name().unwrap().to_string_lossy()
            ));
            fs::rename(&task.path, renamed).unwrap();
        }
    }

    let build = |workers: usize| {
        let out = TempDir::new().unwrap();
        let config = ProcessingConfig::new(input.path(), out.path())
            .with_chunk_size(64)
            .with_workers(workers);
        let dataset = DatasetPipeline::from_config(config).unwrap().build().unwrap().dataset;
        let mut rows: Vec<(Vec<u64>, i64)> = dataset
            .features
            .rows()
            .into_iter()
            .zip(dataset.labels.iter())
            .map(|(row, label)| (row.iter().map(|v| v.to_bits()).collect(), *label))
            .collect();
        rows.sort();
        rows
    };

    let one = build(1);
    let four = build(4);
    assert_eq!(one.len(), 10);
    assert_eq!(one, four);
}
