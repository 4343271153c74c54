//! Parallel batch processing over many labeled files.
//!
//! Files are independent, so they are processed on a local Rayon thread pool
//! of fixed size. Tasks are handed out in batches to amortize dispatch, and
//! each finished file is sent over a channel to the collecting thread, which
//! reports progress while workers keep going.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    BatchProcessor                               │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │              Rayon Thread Pool (worker_count)              │ │
//! │  │                                                            │ │
//! │  │  Worker 1         Worker 2         Worker N                │ │
//! │  │  batch[0..100)    batch[100..200)  ...                     │ │
//! │  │     │                 │                │                   │ │
//! │  │  FileProcessor    FileProcessor    FileProcessor  (shared) │ │
//! │  │     │                 │                │                   │ │
//! │  │     └──── FileOutcome ┴─── channel ────┘                   │ │
//! │  └───────────────────────────┬────────────────────────────────┘ │
//! │                              ▼                                  │
//! │            collector: progress + BatchOutput                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Fault Isolation
//!
//! A failing file becomes a [`FileError`] in the output; a panic inside a
//! task is caught at the task boundary and recorded the same way. Neither
//! stops the remaining files.
//!
//! # Ordering
//!
//! Outcomes are collected in completion order, not dispatch order. Callers
//! that need reproducible row order must sort.
//!
//! # Example
//!
//! ```ignore
//! use stationarity_extractor::batch::{BatchConfig, BatchProcessor, ConsoleProgress};
//! use stationarity_extractor::processor::FileProcessor;
//!
//! let processor = BatchProcessor::new(FileProcessor::new(10_000), BatchConfig::new().with_threads(8))
//!     .with_progress_callback(Box::new(ConsoleProgress::new()));
//!
//! let output = processor.process_files(&tasks)?;
//! let dataset = output.into_dataset()?;
//! ```

use crate::config::{ProcessingConfig, DEFAULT_DISPATCH_BATCH_SIZE, DEFAULT_WORKER_COUNT};
use crate::dataset::Dataset;
use crate::error::{ExtractError, Result};
use crate::processor::{FileError, FileOutcome, FileProcessor, ProcessedFile};
use crate::scanner::LabeledFile;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for batch processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Worker pool size, fixed for the run.
    pub num_threads: usize,

    /// Number of consecutive tasks handed to a worker at once.
    ///
    /// Throughput knob only: it does not change which files are accepted.
    pub dispatch_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_threads: DEFAULT_WORKER_COUNT,
            dispatch_batch_size: DEFAULT_DISPATCH_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    /// Create a new batch configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch settings taken from a run configuration.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new()
            .with_threads(config.worker_count)
            .with_dispatch_batch_size(config.dispatch_batch_size)
    }

    /// Set the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if threads is 0.
    pub fn with_threads(mut self, threads: usize) -> Self {
        assert!(threads > 0, "Thread count must be > 0");
        self.num_threads = threads;
        self
    }

    /// Set the dispatch batch size.
    ///
    /// # Panics
    ///
    /// Panics if batch_size is 0.
    pub fn with_dispatch_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Dispatch batch size must be > 0");
        self.dispatch_batch_size = batch_size;
        self
    }
}

// ============================================================================
// Results
// ============================================================================

/// Aggregated results from batch processing.
#[derive(Debug)]
pub struct BatchOutput {
    /// Accepted files, in collection order.
    pub results: Vec<ProcessedFile>,

    /// Files excluded from the dataset.
    pub errors: Vec<FileError>,

    /// Total processing time (wall clock).
    pub elapsed: Duration,

    /// Number of threads used.
    pub threads_used: usize,
}

impl BatchOutput {
    /// Number of files dispatched.
    pub fn total_count(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    /// Get count of accepted files.
    pub fn successful_count(&self) -> usize {
        self.results.len()
    }

    /// Get count of failed files.
    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    /// Check if all files were processed successfully.
    pub fn all_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get speedup factor compared to sequential processing.
    ///
    /// Calculated as: sum of per-file processing times / total wall clock time
    pub fn speedup_factor(&self) -> f64 {
        let sequential_time: Duration = self.results.iter().map(|r| r.elapsed).sum();
        sequential_time.as_secs_f64() / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }

    /// Iterate over accepted files.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessedFile> {
        self.results.iter()
    }

    /// Iterate over errors.
    pub fn iter_errors(&self) -> impl Iterator<Item = &FileError> {
        self.errors.iter()
    }

    /// Reconcile widths and build the final matrix, in collection order.
    ///
    /// Fails with [`ExtractError::NoData`] when no file was accepted.
    pub fn into_dataset(self) -> Result<Dataset> {
        if self.results.is_empty() {
            return Err(ExtractError::NoData(format!(
                "all {} dispatched files failed",
                self.errors.len()
            )));
        }
        Dataset::from_vectors(self.results.into_iter().map(|r| (r.features, r.label)))
    }
}

// ============================================================================
// Progress Reporting
// ============================================================================

/// Progress information for callbacks.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// File that just finished.
    pub current_file: String,

    /// Total number of files to process.
    pub total_files: usize,

    /// Number of files accepted so far.
    pub completed: usize,

    /// Number of files failed so far.
    pub failed: usize,

    /// Elapsed time since start.
    pub elapsed: Duration,
}

impl ProgressInfo {
    /// Files finished so far, accepted or not.
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    /// Get completion percentage (0.0 to 100.0).
    pub fn percent_complete(&self) -> f64 {
        if self.total_files == 0 {
            100.0
        } else {
            self.processed() as f64 / self.total_files as f64 * 100.0
        }
    }

    /// Estimate remaining time based on current progress.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let done = self.processed();
        if done == 0 {
            return None;
        }
        let remaining = self.total_files.saturating_sub(done);
        let avg_time = self.elapsed.as_secs_f64() / done as f64;
        Some(Duration::from_secs_f64(avg_time * remaining as f64))
    }
}

/// Trait for progress reporting callbacks.
///
/// Called from the collecting thread, never from a worker.
pub trait ProgressCallback: Send + Sync {
    /// Called after each file finishes.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called when batch processing completes.
    fn on_complete(&self, output: &BatchOutput);
}

/// Simple console progress reporter.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    /// Print one line per file instead of an updating counter.
    pub verbose: bool,
}

impl ConsoleProgress {
    /// Create a new console progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable verbose output.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if self.verbose {
            println!(
                "[{:5}/{:5}] Processed: {} ({:.1}% complete)",
                info.processed(),
                info.total_files,
                info.current_file,
                info.percent_complete()
            );
        } else {
            print!(
                "\rProcessing files [{:5}/{:5}] {:.1}%",
                info.processed(),
                info.total_files,
                info.percent_complete()
            );
            use std::io::Write;
            std::io::stdout().flush().ok();
        }
    }

    fn on_complete(&self, output: &BatchOutput) {
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!("Batch Processing Complete");
        println!("═══════════════════════════════════════════════════════════════");
        println!("  Files accepted:  {}", output.successful_count());
        println!("  Files failed:    {}", output.failed_count());
        println!("  Threads:         {}", output.threads_used);
        println!("  Total time:      {:?}", output.elapsed);
        println!("  Speedup:         {:.2}x", output.speedup_factor());
        println!("═══════════════════════════════════════════════════════════════");
    }
}

// ============================================================================
// Batch Processor
// ============================================================================

/// Parallel batch processor over labeled files.
///
/// # Thread Safety
///
/// - Workers share the [`FileProcessor`] by reference; it holds only
///   read-only settings
/// - Each task owns its chunk buffer and aggregator
/// - Outcomes travel to the collector over an `mpsc` channel
pub struct BatchProcessor {
    /// Per-file processor (shared read-only across threads).
    processor: FileProcessor,

    /// Batch processing configuration.
    batch_config: BatchConfig,

    /// Optional progress callback.
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl BatchProcessor {
    /// Create a new batch processor.
    pub fn new(processor: FileProcessor, batch_config: BatchConfig) -> Self {
        Self {
            processor,
            batch_config,
            progress_callback: None,
        }
    }

    /// Create a batch processor from a run configuration.
    pub fn from_config(config: &ProcessingConfig) -> Result<Self> {
        let processor = FileProcessor::from_config(config)?;
        Ok(Self::new(processor, BatchConfig::from_config(config)))
    }

    /// Set a progress callback.
    pub fn with_progress_callback(mut self, callback: Box<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(Arc::from(callback));
        self
    }

    /// Get the batch configuration.
    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch_config
    }

    /// Get the per-file processor.
    pub fn processor(&self) -> &FileProcessor {
        &self.processor
    }

    /// Process all tasks in parallel.
    ///
    /// Individual file failures never make this return `Err`; only failure to
    /// build the worker pool does.
    pub fn process_files(&self, tasks: &[LabeledFile]) -> Result<BatchOutput> {
        let start = Instant::now();
        let total_files = tasks.len();
        let threads_used = self.batch_config.num_threads;
        let batch_size = self.batch_config.dispatch_batch_size.max(1);

        log::info!(
            "Processing {} files on {} threads (dispatch batch {})",
            total_files,
            threads_used,
            batch_size
        );

        // Local pool so different processors can use different thread counts
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads_used)
            .build()
            .map_err(|e| ExtractError::ThreadPool(format!("Failed to create thread pool: {e}")))?;

        let (sender, receiver) = mpsc::channel::<FileOutcome>();
        let processor = &self.processor;

        let mut results = Vec::new();
        let mut errors = Vec::new();

        thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    tasks
                        .par_chunks(batch_size)
                        .for_each_with(sender, |sender, batch| {
                            for task in batch {
                                let outcome = run_isolated(task, || processor.process(task));
                                // Receiver lives until every sender is dropped
                                let _ = sender.send(outcome);
                            }
                        });
                });
            });

            for outcome in receiver {
                let current_file = outcome.path().display().to_string();
                match outcome {
                    FileOutcome::Accepted(file) => results.push(file),
                    FileOutcome::Failed(err) => errors.push(err),
                }

                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(&ProgressInfo {
                        current_file,
                        total_files,
                        completed: results.len(),
                        failed: errors.len(),
                        elapsed: start.elapsed(),
                    });
                }
            }
        });

        let output = BatchOutput {
            results,
            errors,
            elapsed: start.elapsed(),
            threads_used,
        };

        log::info!(
            "Processed {} files: {} accepted, {} failed in {:?}",
            output.total_count(),
            output.successful_count(),
            output.failed_count(),
            output.elapsed
        );

        if let Some(ref callback) = self.progress_callback {
            callback.on_complete(&output);
        }

        Ok(output)
    }
}

/// Run one task, turning a panic into a failed outcome.
fn run_isolated<F>(task: &LabeledFile, work: F) -> FileOutcome
where
    F: FnOnce() -> FileOutcome,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::warn!("Task for {} panicked: {}", task.path.display(), reason);
            FileOutcome::Failed(FileError {
                path: task.path.clone(),
                label: task.label,
                error: format!("panicked: {reason}"),
            })
        }
    }
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// Process files with default batch settings.
pub fn process_files_parallel(
    processor: &FileProcessor,
    tasks: &[LabeledFile],
) -> Result<BatchOutput> {
    BatchProcessor::new(processor.clone(), BatchConfig::default()).process_files(tasks)
}

/// Process files with specified thread count.
pub fn process_files_with_threads(
    processor: &FileProcessor,
    tasks: &[LabeledFile],
    threads: usize,
) -> Result<BatchOutput> {
    let batch_config = BatchConfig::new().with_threads(threads);
    BatchProcessor::new(processor.clone(), batch_config).process_files(tasks)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::new();
        assert_eq!(config.num_threads, 4);
        assert_eq!(config.dispatch_batch_size, 100);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new()
            .with_threads(8)
            .with_dispatch_batch_size(10);

        assert_eq!(config.num_threads, 8);
        assert_eq!(config.dispatch_batch_size, 10);
    }

    #[test]
    fn test_batch_config_from_processing_config() {
        let config = ProcessingConfig::default()
            .with_workers(2)
            .with_dispatch_batch_size(7);
        let batch = BatchConfig::from_config(&config);
        assert_eq!(batch.num_threads, 2);
        assert_eq!(batch.dispatch_batch_size, 7);
    }

    #[test]
    #[should_panic(expected = "Thread count must be > 0")]
    fn test_batch_config_zero_threads() {
        BatchConfig::new().with_threads(0);
    }

    #[test]
    #[should_panic(expected = "Dispatch batch size must be > 0")]
    fn test_batch_config_zero_batch() {
        BatchConfig::new().with_dispatch_batch_size(0);
    }

    #[test]
    fn test_progress_info_percent() {
        let info = ProgressInfo {
            current_file: "a.csv".to_string(),
            total_files: 10,
            completed: 4,
            failed: 1,
            elapsed: Duration::from_secs(10),
        };

        assert_eq!(info.processed(), 5);
        assert_eq!(info.percent_complete(), 50.0);
        assert_eq!(info.estimated_remaining(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_empty_task_list() {
        let output = BatchProcessor::new(FileProcessor::new(10), BatchConfig::new())
            .process_files(&[])
            .unwrap();
        assert_eq!(output.total_count(), 0);
        assert!(output.all_successful());
        assert!(matches!(output.into_dataset(), Err(ExtractError::NoData(_))));
    }

    #[test]
    fn test_missing_files_become_errors() {
        let tasks: Vec<LabeledFile> = (0..5)
            .map(|i| LabeledFile::new(PathBuf::from(format!("/nonexistent/{i}.csv")), i % 2))
            .collect();
        let output = BatchProcessor::new(
            FileProcessor::new(10),
            BatchConfig::new().with_threads(2).with_dispatch_batch_size(2),
        )
        .process_files(&tasks)
        .unwrap();

        assert_eq!(output.successful_count(), 0);
        assert_eq!(output.failed_count(), 5);
        let mut failed: Vec<_> = output.iter_errors().map(|e| e.path.clone()).collect();
        failed.sort();
        let mut expected: Vec<_> = tasks.iter().map(|t| t.path.clone()).collect();
        expected.sort();
        assert_eq!(failed, expected);
    }

    #[test]
    fn test_panicking_task_becomes_failure() {
        let task = LabeledFile::new("/data/stationary/boom.csv", 0);
        let outcome = run_isolated(&task, || panic!("boom"));

        match outcome {
            FileOutcome::Failed(err) => {
                assert_eq!(err.path, task.path);
                assert_eq!(err.label, 0);
                assert!(err.error.starts_with("panicked:"), "{}", err.error);
                assert!(err.error.contains("boom"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_formatted_panic_payload_is_reported() {
        let task = LabeledFile::new("/data/trend/x.csv", 1);
        let rows = 17;
        let outcome = run_isolated(&task, || panic!("bad row {}", rows));

        match outcome {
            FileOutcome::Failed(err) => {
                assert_eq!(err.path, task.path);
                assert_eq!(err.label, 1);
                assert_eq!(err.error, "panicked: bad row 17");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_non_panicking_task_passes_through() {
        let task = LabeledFile::new("/nonexistent/a.csv", 1);
        let processor = FileProcessor::new(10);
        let outcome = run_isolated(&task, || processor.process(&task));

        assert!(!outcome.is_accepted());
        assert_eq!(outcome.path(), task.path.as_path());
        if let FileOutcome::Failed(err) = outcome {
            assert!(!err.error.starts_with("panicked:"));
        }
    }
}
