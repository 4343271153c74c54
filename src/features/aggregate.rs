//! Cross-chunk aggregation.
//!
//! A file is streamed as many chunks, each producing a [`ChunkFeatures`].
//! The aggregator folds them into one per-file [`FeatureVector`] without
//! keeping the chunk vectors around:
//!
//! | Chunks | Result |
//! |--------|--------|
//! | 0 | no vector (the file failed) |
//! | 1 | the chunk's features, verbatim (25 values) |
//! | K > 1 | `<name>_mean`, `<name>_std` per feature (50 values) |
//!
//! Means and population standard deviations use Welford's online algorithm,
//! so memory stays at two arrays of [`FEATURE_COUNT`] values regardless of
//! how many chunks a file has.

use super::{ChunkFeatures, FeatureName, FEATURE_COUNT};

/// Per-file feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureVector {
    /// Exactly one usable chunk
    Single(ChunkFeatures),

    /// Several usable chunks, summarised per feature
    Aggregated {
        chunks: usize,
        mean: [f64; FEATURE_COUNT],
        std: [f64; FEATURE_COUNT],
    },
}

impl FeatureVector {
    /// Width of a single-chunk vector.
    pub const SINGLE_WIDTH: usize = FEATURE_COUNT;

    /// Width of an aggregated vector.
    pub const AGGREGATED_WIDTH: usize = 2 * FEATURE_COUNT;

    /// Number of chunks that contributed.
    pub fn chunk_count(&self) -> usize {
        match self {
            FeatureVector::Single(_) => 1,
            FeatureVector::Aggregated { chunks, .. } => *chunks,
        }
    }

    /// Number of values in the flattened vector.
    pub fn width(&self) -> usize {
        match self {
            FeatureVector::Single(_) => Self::SINGLE_WIDTH,
            FeatureVector::Aggregated { .. } => Self::AGGREGATED_WIDTH,
        }
    }

    /// Flatten into matrix-row order.
    ///
    /// Aggregated vectors interleave per feature: `mean_mean, mean_std,
    /// std_mean, std_std, ...`.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            FeatureVector::Single(features) => features.values().to_vec(),
            FeatureVector::Aggregated { mean, std, .. } => mean
                .iter()
                .zip(std.iter())
                .flat_map(|(m, s)| [*m, *s])
                .collect(),
        }
    }

    /// Column names matching [`to_vec`](Self::to_vec).
    pub fn names(&self) -> Vec<String> {
        Self::names_for_width(self.width()).unwrap_or_default()
    }

    /// Column names for a known schema width, `None` for any other width.
    pub fn names_for_width(width: usize) -> Option<Vec<String>> {
        match width {
            Self::SINGLE_WIDTH => Some(
                FeatureName::ALL
                    .iter()
                    .map(|name| name.as_str().to_string())
                    .collect(),
            ),
            Self::AGGREGATED_WIDTH => Some(
                FeatureName::ALL
                    .iter()
                    .flat_map(|name| [format!("{name}_mean"), format!("{name}_std")])
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Streaming accumulator over chunk feature vectors.
#[derive(Debug, Clone)]
pub struct ChunkAggregator {
    count: usize,
    first: Option<ChunkFeatures>,
    mean: [f64; FEATURE_COUNT],
    m2: [f64; FEATURE_COUNT],
}

impl Default for ChunkAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkAggregator {
    pub fn new() -> Self {
        Self {
            count: 0,
            first: None,
            mean: [0.0; FEATURE_COUNT],
            m2: [0.0; FEATURE_COUNT],
        }
    }

    /// Number of chunks folded in so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Fold one chunk's features in.
    pub fn push(&mut self, features: ChunkFeatures) {
        if self.first.is_none() {
            self.first = Some(features);
        }
        self.count += 1;
        let n = self.count as f64;
        for (i, &value) in features.values().iter().enumerate() {
            // Welford's online algorithm for mean and variance
            let delta = value - self.mean[i];
            self.mean[i] += delta / n;
            let delta2 = value - self.mean[i];
            self.m2[i] += delta * delta2;
        }
    }

    /// Final per-file vector, `None` when no chunk was pushed.
    pub fn finish(self) -> Option<FeatureVector> {
        match self.count {
            0 => None,
            1 => self.first.map(FeatureVector::Single),
            count => {
                let n = count as f64;
                let mut std = [0.0; FEATURE_COUNT];
                for (s, m2) in std.iter_mut().zip(self.m2.iter()) {
                    *s = (m2 / n).max(0.0).sqrt();
                }
                Some(FeatureVector::Aggregated {
                    chunks: count,
                    mean: self.mean,
                    std,
                })
            }
        }
    }
}
