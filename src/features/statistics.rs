//! Descriptive statistics over in-memory series.
//!
//! All dispersion measures are population statistics (divisor `N`). Guards
//! for short or constant input return `0.0` rather than dividing by zero, so
//! a finite input always produces finite moments.

/// Arithmetic mean. `0.0` for an empty slice.
#[inline]
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance around a precomputed mean.
#[inline]
pub fn variance_with_mean(data: &[f64], mean: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / data.len() as f64
}

/// Population variance.
#[inline]
pub fn variance(data: &[f64]) -> f64 {
    variance_with_mean(data, mean(data))
}

/// Population standard deviation.
#[inline]
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Percentile `q` (0-100) of an ascending slice, linearly interpolated
/// between the closest ranks.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = (n - 1) as f64 * (q / 100.0);
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Bias-corrected sample skewness.
///
/// ```text
/// G1 = N / ((N-1)(N-2)) * Σ((x - mean) / std)³
/// ```
///
/// Zero when `std == 0` or `N < 3`.
pub fn skewness(data: &[f64], mean: f64, std: f64) -> f64 {
    let n = data.len();
    if std == 0.0 || n < 3 {
        return 0.0;
    }
    let n = n as f64;
    let sum_cubed: f64 = data.iter().map(|x| ((x - mean) / std).powi(3)).sum();
    (n / ((n - 1.0) * (n - 2.0))) * sum_cubed
}

/// Bias-corrected excess kurtosis.
///
/// ```text
/// G2 = N(N+1) / ((N-1)(N-2)(N-3)) * Σ((x - mean) / std)⁴ - 3(N-1)² / ((N-2)(N-3))
/// ```
///
/// Zero when `std == 0` or `N < 4`.
pub fn kurtosis(data: &[f64], mean: f64, std: f64) -> f64 {
    let n = data.len();
    if std == 0.0 || n < 4 {
        return 0.0;
    }
    let n = n as f64;
    let sum_fourth: f64 = data.iter().map(|x| ((x - mean) / std).powi(4)).sum();
    (n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))) * sum_fourth
        - (3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0)))
}

/// First difference `x[i+1] - x[i]`.
#[inline]
pub fn diff(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Structure of sliding-window statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    /// Std of the window means
    pub mean_std: f64,
    /// Mean of the window stds
    pub std_mean: f64,
    /// Std of the window stds
    pub std_std: f64,
}

/// Sliding-window mean/std summary over every start position.
///
/// Returns `None` when the window does not fit strictly inside the series
/// (`window == 0` or `window >= N`).
///
/// Window sums come from running prefix sums, so the cost is O(N) for any
/// window length. Values are centered on the series mean first to keep the
/// squared sums well conditioned.
pub fn rolling_stats(data: &[f64], window: usize) -> Option<RollingStats> {
    if window == 0 || window >= data.len() {
        return None;
    }
    let center = mean(data);
    let mut sum = Vec::with_capacity(data.len() + 1);
    let mut sum_sq = Vec::with_capacity(data.len() + 1);
    sum.push(0.0);
    sum_sq.push(0.0);
    let (mut s, mut s2) = (0.0, 0.0);
    for x in data {
        let c = x - center;
        s += c;
        s2 += c * c;
        sum.push(s);
        sum_sq.push(s2);
    }

    let w = window as f64;
    let count = data.len() - window + 1;
    let mut means = Vec::with_capacity(count);
    let mut stds = Vec::with_capacity(count);
    for start in 0..count {
        let end = start + window;
        let m = (sum[end] - sum[start]) / w;
        let var = (sum_sq[end] - sum_sq[start]) / w - m * m;
        means.push(m + center);
        // Cancellation can leave a tiny negative residue
        stds.push(var.max(0.0).sqrt());
    }
    Some(RollingStats {
        mean_std: std_dev(&means),
        std_mean: mean(&stds),
        std_std: std_dev(&stds),
    })
}

/// Autocorrelation at `lag`, normalized by the lag-0 autocovariance.
///
/// Zero when `lag < 1`, `lag >= N`, or the series is constant.
pub fn autocorrelation(data: &[f64], lag: usize) -> f64 {
    let n = data.len();
    if lag < 1 || lag >= n {
        return 0.0;
    }
    let m = mean(data);
    let c0 = data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / n as f64;
    if c0 == 0.0 {
        return 0.0;
    }
    let ck = data[..n - lag]
        .iter()
        .zip(&data[lag..])
        .map(|(a, b)| (a - m) * (b - m))
        .sum::<f64>()
        / n as f64;
    ck / c0
}

/// Number of strict interior local maxima.
pub fn count_peaks(data: &[f64]) -> usize {
    if data.len() < 3 {
        return 0;
    }
    data.windows(3)
        .filter(|w| w[1] > w[0] && w[1] > w[2])
        .count()
}

/// Sign as -1, 0 or 1 (zero maps to zero, unlike `f64::signum`).
#[inline]
fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Fraction of adjacent pairs whose sign differs in `x - center`.
pub fn zero_crossing_rate(data: &[f64], center: f64) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let crossings = data
        .windows(2)
        .filter(|w| sign(w[0] - center) != sign(w[1] - center))
        .count();
    crossings as f64 / (data.len() - 1) as f64
}
