//! Stationarity Dataset Build Tool
//!
//! Scans a labeled directory of time-series files, extracts per-file
//! statistical features in parallel and writes `features.npy`, `labels.npy`
//! and `metadata.json`.
//!
//! # Usage
//!
//! ```bash
//! # Run from a configuration file (TOML or JSON)
//! cargo run --release --bin build_dataset -- --config configs/run.toml
//!
//! # Run with default tuning on explicit directories
//! cargo run --release --bin build_dataset -- --input data/raw --output data/processed
//!
//! # Generate a sample configuration
//! cargo run --release --bin build_dataset -- --generate-config configs/sample.toml
//!
//! # One progress line per file instead of an updating counter
//! cargo run --release --bin build_dataset -- --config configs/run.toml --verbose
//! ```
//!
//! Verbosity is controlled through `RUST_LOG` (e.g. `RUST_LOG=debug`).
//!
//! # Input Layout
//!
//! ```text
//! input_dir/
//! ├── stationary/        → label_map.stationary
//! │   ├── series_001.csv
//! │   └── ...
//! └── non_stationary/    → label_map.non_stationary
//!     └── ...
//! ```

use stationarity_extractor::prelude::*;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("Stationarity Dataset Build Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    build_dataset --config <path.toml|path.json>");
    eprintln!("    build_dataset --input <dir> --output <dir>");
    eprintln!("    build_dataset --generate-config <path>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --config <path>            Load run configuration from file");
    eprintln!("    --input <dir>              Root directory with class folders");
    eprintln!("    --output <dir>             Directory for the exported arrays");
    eprintln!("    --generate-config <path>   Write a sample configuration and exit");
    eprintln!("    --verbose                  Print one progress line per file");
    eprintln!("    --help                     Show this message");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    RUST_LOG                   Log level (error, warn, info, debug, trace)");
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<String> = None;
    let mut input_dir: Option<String> = None;
    let mut output_dir: Option<String> = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "--generate-config" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("❌ --generate-config requires a path");
                    return ExitCode::FAILURE;
                };
                return generate_sample_config(path);
            }
            "--verbose" | "-v" => {
                verbose = true;
                i += 1;
            }
            flag @ ("--config" | "--input" | "--output") => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("❌ {} requires a value", flag);
                    return ExitCode::FAILURE;
                };
                match flag {
                    "--config" => config_path = Some(value.clone()),
                    "--input" => input_dir = Some(value.clone()),
                    _ => output_dir = Some(value.clone()),
                }
                i += 2;
            }
            other => {
                eprintln!("❌ Unknown argument: {}", other);
                print_usage();
                return ExitCode::FAILURE;
            }
        }
    }

    let config = match (config_path, input_dir, output_dir) {
        (Some(path), None, None) => match ProcessingConfig::load(&path) {
            Ok(c) => {
                println!("✅ Loaded configuration: {}", path);
                c
            }
            Err(e) => {
                eprintln!("❌ Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        (None, Some(input), Some(output)) => ProcessingConfig::new(input, output),
        _ => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration validation failed: {}", e);
        return ExitCode::FAILURE;
    }

    print_config_summary(&config);

    match run(config, verbose) {
        Ok(summary) => {
            print_run_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Build failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ProcessingConfig, verbose: bool) -> Result<RunSummary> {
    let progress = if verbose {
        ConsoleProgress::new().verbose()
    } else {
        ConsoleProgress::new()
    };
    DatasetPipeline::from_config(config)?
        .with_progress_callback(Box::new(progress))
        .run()
}

fn generate_sample_config(path: &str) -> ExitCode {
    let sample = ProcessingConfig::new("data/raw", "data/processed").with_files_per_folder_limit(1000);

    let saved = if path.ends_with(".json") {
        sample.save_json(path)
    } else {
        sample.save_toml(path)
    };

    match saved {
        Ok(()) => {
            println!("✅ Generated sample config: {}", path);
            println!("\nEdit the following fields before running:");
            println!("  - input_dir: Root with stationary/ and non_stationary/ folders");
            println!("  - output_dir: Destination for features.npy and labels.npy");
            println!("  - files_per_folder_limit: Remove to take every file");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error generating config: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_config_summary(config: &ProcessingConfig) {
    println!("┌─ Configuration Summary ───────────────────────────────────────┐");
    println!("│ Input:        {}", config.input_dir.display());
    println!("│ Output:       {}", config.output_dir.display());
    println!("│ Chunk size:   {}", config.chunk_size);
    match config.files_per_folder_limit {
        Some(limit) => println!("│ Folder limit: {}", limit),
        None => println!("│ Folder limit: none"),
    }
    println!("│ Workers:      {}", config.worker_count);
    println!("│ Dispatch:     {} files per batch", config.dispatch_batch_size);
    println!("│ Column:       {}", config.data_column);
    println!(
        "│ Labels:       stationary={}, non_stationary={}",
        config.label_map.stationary, config.label_map.non_stationary
    );
    println!("└───────────────────────────────────────────────────────────────┘");
    println!();
}

fn print_run_summary(summary: &RunSummary) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                       Build Complete                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("  Files found:     {}", summary.files_found);
    println!("  Files accepted:  {}", summary.files_accepted);
    println!("  Files failed:    {}", summary.files_failed);
    println!(
        "  Dataset:         {} samples × {} features",
        summary.n_samples, summary.n_features
    );
    println!("  Features:        {}", summary.paths.features_path.display());
    println!("  Labels:          {}", summary.paths.labels_path.display());
    println!("  Metadata:        {}", summary.paths.metadata_path.display());
    println!("  Elapsed:         {:.2?}", summary.elapsed);
}
