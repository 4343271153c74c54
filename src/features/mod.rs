//! Statistical feature extraction for time-series chunks.
//!
//! A chunk is a bounded, in-memory slice of one file's data column. Every
//! chunk yields the same fixed set of 25 features, in a fixed order, so
//! vectors from different files line up column by column.
//!
//! # Architecture
//!
//! - `statistics`: moment, percentile, rolling and dependence primitives
//! - `aggregate`: streaming cross-chunk aggregation into a per-file vector
//!
//! # Feature Layout
//!
//! | Index | Group | Features |
//! |-------|-------|----------|
//! | 0-9 | Location/spread | mean, std, var, min, max, range, q25, median, q75, iqr |
//! | 10-12 | Shape | skewness, kurtosis, cv |
//! | 13-17 | Differencing | diff1_mean, diff1_std, diff1_var, diff2_mean, diff2_std |
//! | 18-20 | Rolling | rolling_mean_std, rolling_std_mean, rolling_std_std |
//! | 21-22 | Dependence | autocorr_lag1, autocorr_lag10 |
//! | 23-24 | Oscillation | num_peaks, zero_crossing_rate |
//!
//! # Usage
//!
//! ```
//! use stationarity_extractor::features::{extract_chunk_features, FeatureName};
//!
//! let data: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
//! let features = extract_chunk_features(&data).expect("finite input");
//! assert!(features.get(FeatureName::Std) > 0.0);
//!
//! // Fewer than two values produce no features at all
//! assert!(extract_chunk_features(&[1.0]).is_none());
//! ```

pub mod aggregate;
pub mod statistics;

pub use aggregate::{ChunkAggregator, FeatureVector};

use serde::{Deserialize, Serialize};
use statistics::{
    autocorrelation, count_peaks, diff, kurtosis, mean, percentile_sorted, rolling_stats,
    skewness, std_dev, variance_with_mean, zero_crossing_rate,
};

/// Number of features produced per chunk.
pub const FEATURE_COUNT: usize = 25;

/// Guard added to the mean in the coefficient of variation.
pub const CV_EPSILON: f64 = 1e-10;

/// Largest lag used for the long-range autocorrelation feature.
pub const MAX_AUTOCORR_LAG: usize = 10;

/// Minimum values a chunk needs to produce features.
pub const MIN_CHUNK_LEN: usize = 2;

/// Names of the per-chunk features, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureName {
    Mean,
    Std,
    Var,
    Min,
    Max,
    Range,
    Q25,
    Median,
    Q75,
    Iqr,
    Skewness,
    Kurtosis,
    Cv,
    Diff1Mean,
    Diff1Std,
    Diff1Var,
    Diff2Mean,
    Diff2Std,
    RollingMeanStd,
    RollingStdMean,
    RollingStdStd,
    AutocorrLag1,
    AutocorrLag10,
    NumPeaks,
    ZeroCrossingRate,
}

impl FeatureName {
    /// All features in vector order.
    pub const ALL: [FeatureName; FEATURE_COUNT] = [
        FeatureName::Mean,
        FeatureName::Std,
        FeatureName::Var,
        FeatureName::Min,
        FeatureName::Max,
        FeatureName::Range,
        FeatureName::Q25,
        FeatureName::Median,
        FeatureName::Q75,
        FeatureName::Iqr,
        FeatureName::Skewness,
        FeatureName::Kurtosis,
        FeatureName::Cv,
        FeatureName::Diff1Mean,
        FeatureName::Diff1Std,
        FeatureName::Diff1Var,
        FeatureName::Diff2Mean,
        FeatureName::Diff2Std,
        FeatureName::RollingMeanStd,
        FeatureName::RollingStdMean,
        FeatureName::RollingStdStd,
        FeatureName::AutocorrLag1,
        FeatureName::AutocorrLag10,
        FeatureName::NumPeaks,
        FeatureName::ZeroCrossingRate,
    ];

    /// Position in the feature vector.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in exported metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::Mean => "mean",
            FeatureName::Std => "std",
            FeatureName::Var => "var",
            FeatureName::Min => "min",
            FeatureName::Max => "max",
            FeatureName::Range => "range",
            FeatureName::Q25 => "q25",
            FeatureName::Median => "median",
            FeatureName::Q75 => "q75",
            FeatureName::Iqr => "iqr",
            FeatureName::Skewness => "skewness",
            FeatureName::Kurtosis => "kurtosis",
            FeatureName::Cv => "cv",
            FeatureName::Diff1Mean => "diff1_mean",
            FeatureName::Diff1Std => "diff1_std",
            FeatureName::Diff1Var => "diff1_var",
            FeatureName::Diff2Mean => "diff2_mean",
            FeatureName::Diff2Std => "diff2_std",
            FeatureName::RollingMeanStd => "rolling_mean_std",
            FeatureName::RollingStdMean => "rolling_std_mean",
            FeatureName::RollingStdStd => "rolling_std_std",
            FeatureName::AutocorrLag1 => "autocorr_lag1",
            FeatureName::AutocorrLag10 => "autocorr_lag10",
            FeatureName::NumPeaks => "num_peaks",
            FeatureName::ZeroCrossingRate => "zero_crossing_rate",
        }
    }
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature values of one chunk, indexed by [`FeatureName`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkFeatures {
    values: [f64; FEATURE_COUNT],
}

impl ChunkFeatures {
    /// Wrap raw values laid out in [`FeatureName::ALL`] order.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Value of one feature.
    #[inline]
    pub fn get(&self, name: FeatureName) -> f64 {
        self.values[name.index()]
    }

    /// All values in vector order.
    #[inline]
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// `(name, value)` pairs in vector order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.iter().copied().zip(self.values.iter().copied())
    }

    fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Compute the fixed feature set of one chunk.
///
/// Returns `None` when the chunk has fewer than two values or when any
/// feature comes out non-finite (e.g. an infinite input value). The caller
/// skips such chunks; the rest of the file is unaffected.
pub fn extract_chunk_features(data: &[f64]) -> Option<ChunkFeatures> {
    let n = data.len();
    if n < MIN_CHUNK_LEN {
        return None;
    }

    let mut v = [0.0; FEATURE_COUNT];

    // Location and spread
    let m = mean(data);
    let var = variance_with_mean(data, m);
    let std = var.sqrt();

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let min = sorted[0];
    let max = sorted[n - 1];
    let q25 = percentile_sorted(&sorted, 25.0);
    let q75 = percentile_sorted(&sorted, 75.0);

    v[FeatureName::Mean.index()] = m;
    v[FeatureName::Std.index()] = std;
    v[FeatureName::Var.index()] = var;
    v[FeatureName::Min.index()] = min;
    v[FeatureName::Max.index()] = max;
    v[FeatureName::Range.index()] = max - min;
    v[FeatureName::Q25.index()] = q25;
    v[FeatureName::Median.index()] = percentile_sorted(&sorted, 50.0);
    v[FeatureName::Q75.index()] = q75;
    v[FeatureName::Iqr.index()] = q75 - q25;
    drop(sorted);

    // Shape
    v[FeatureName::Skewness.index()] = skewness(data, m, std);
    v[FeatureName::Kurtosis.index()] = kurtosis(data, m, std);
    v[FeatureName::Cv.index()] = std / (m + CV_EPSILON);

    // Differencing
    let diff1 = diff(data);
    let diff1_mean = mean(&diff1);
    let diff1_var = variance_with_mean(&diff1, diff1_mean);
    v[FeatureName::Diff1Mean.index()] = diff1_mean;
    v[FeatureName::Diff1Std.index()] = diff1_var.sqrt();
    v[FeatureName::Diff1Var.index()] = diff1_var;
    if diff1.len() > 1 {
        let diff2 = diff(&diff1);
        v[FeatureName::Diff2Mean.index()] = mean(&diff2);
        v[FeatureName::Diff2Std.index()] = std_dev(&diff2);
    }

    // Rolling structure
    let window = (n / 10).max(2);
    match rolling_stats(data, window) {
        Some(rolling) => {
            v[FeatureName::RollingMeanStd.index()] = rolling.mean_std;
            v[FeatureName::RollingStdMean.index()] = rolling.std_mean;
            v[FeatureName::RollingStdStd.index()] = rolling.std_std;
        }
        None => {
            v[FeatureName::RollingStdMean.index()] = std;
        }
    }

    // Temporal dependence
    v[FeatureName::AutocorrLag1.index()] = autocorrelation(data, 1);
    v[FeatureName::AutocorrLag10.index()] = autocorrelation(data, MAX_AUTOCORR_LAG.min(n - 1));

    // Oscillation
    v[FeatureName::NumPeaks.index()] = count_peaks(data) as f64;
    v[FeatureName::ZeroCrossingRate.index()] = zero_crossing_rate(data, m);

    let features = ChunkFeatures::from_values(v);
    if !features.is_finite() {
        log::debug!("Discarding chunk of {} values with non-finite features", n);
        return None;
    }
    Some(features)
}
