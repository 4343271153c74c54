//! Dataset assembly and width reconciliation.
//!
//! Files can aggregate a different number of chunks, so accepted vectors do
//! not always share a width (25 values for one chunk, 50 for several).
//! Shorter rows are right-padded with zeros to the widest row before the
//! matrix is built.
//!
//! Padding does not distinguish a missing feature from a zero-valued one.
//! [`Dataset::padded_rows`] records how many rows were affected so the
//! exported metadata makes the mix visible.

use crate::error::{ExtractError, Result};
use crate::features::FeatureVector;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Final feature matrix and label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// `[n_samples, n_features]`
    pub features: Array2<f64>,

    /// `[n_samples]`
    pub labels: Array1<i64>,

    /// Column names, when the reconciled width matches a known schema
    pub feature_names: Option<Vec<String>>,

    /// Rows that were right-padded to reach the common width
    pub padded_rows: usize,
}

impl Dataset {
    /// Build a dataset from `(row, label)` pairs, padding rows to a common width.
    ///
    /// Fails with [`ExtractError::NoData`] when `rows` is empty.
    pub fn from_rows(rows: Vec<(Vec<f64>, i64)>) -> Result<Self> {
        if rows.is_empty() {
            return Err(ExtractError::NoData(
                "no file produced a feature vector".to_string(),
            ));
        }

        let (mut values, labels): (Vec<Vec<f64>>, Vec<i64>) = rows.into_iter().unzip();
        let (width, padded_rows) = pad_to_common_width(&mut values);
        let n_samples = values.len();

        let flat: Vec<f64> = values.into_iter().flatten().collect();
        let features = Array2::from_shape_vec((n_samples, width), flat)?;

        Ok(Self {
            features,
            labels: Array1::from_vec(labels),
            feature_names: FeatureVector::names_for_width(width),
            padded_rows,
        })
    }

    /// Build a dataset from accepted per-file vectors.
    pub fn from_vectors<I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FeatureVector, i64)>,
    {
        Self::from_rows(
            vectors
                .into_iter()
                .map(|(vector, label)| (vector.to_vec(), label))
                .collect(),
        )
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Count of samples per label value.
    pub fn label_distribution(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for label in self.labels.iter() {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }
}

/// Right-pad every row with zeros to the widest row.
///
/// Returns the common width and the number of rows that were padded.
pub fn pad_to_common_width(rows: &mut [Vec<f64>]) -> (usize, usize) {
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut padded = 0;
    for row in rows.iter_mut() {
        if row.len() < max_width {
            row.resize(max_width, 0.0);
            padded += 1;
        }
    }
    if padded > 0 {
        log::warn!(
            "Feature vectors have inconsistent lengths; padded {} rows to {} columns",
            padded,
            max_width
        );
    }
    (max_width, padded)
}

/// Fit one row to a training width, padding with zeros on the right.
///
/// Used when a single file must be scored against a matrix built earlier.
/// A row wider than `width` cannot be aligned and is rejected.
pub fn align_to_width(mut row: Vec<f64>, width: usize) -> Result<Array1<f64>> {
    if row.len() > width {
        return Err(ExtractError::WidthMismatch {
            expected: width,
            actual: row.len(),
        });
    }
    row.resize(width, 0.0);
    Ok(Array1::from_vec(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{extract_chunk_features, ChunkAggregator, FEATURE_COUNT};

    #[test]
    fn test_pads_shorter_rows_with_zeros() {
        let rows = vec![
            ((0..10).map(|i| i as f64 + 1.0).collect::<Vec<_>>(), 0),
            ((0..14).map(|i| i as f64 + 1.0).collect::<Vec<_>>(), 1),
        ];
        let dataset = Dataset::from_rows(rows).unwrap();

        assert_eq!(dataset.features.dim(), (2, 14));
        assert_eq!(dataset.labels.len(), 2);
        assert_eq!(dataset.padded_rows, 1);

        let short = dataset.features.row(0);
        assert_eq!(short[9], 10.0);
        assert!(short.iter().skip(10).all(|v| *v == 0.0));
        assert_eq!(short.iter().skip(10).count(), 4);
        assert_eq!(dataset.features.row(1)[13], 14.0);
        assert!(dataset.feature_names.is_none());
    }

    #[test]
    fn test_uniform_widths_are_untouched() {
        let mut rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(pad_to_common_width(&mut rows), (2, 0));
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_empty_rows_is_no_data() {
        assert!(matches!(
            Dataset::from_rows(Vec::new()),
            Err(ExtractError::NoData(_))
        ));
    }

    #[test]
    fn test_from_vectors_names_aggregated_schema() {
        let data: Vec<f64> = (0..30).map(|i| (i as f64).cos()).collect();
        let single = extract_chunk_features(&data).unwrap();

        let mut agg = ChunkAggregator::new();
        agg.push(single);
        agg.push(extract_chunk_features(&data[..20]).unwrap());
        let aggregated = agg.finish().unwrap();

        let dataset = Dataset::from_vectors(vec![
            (FeatureVector::Single(single), 0),
            (aggregated, 1),
        ])
        .unwrap();

        assert_eq!(dataset.n_features(), 2 * FEATURE_COUNT);
        assert_eq!(dataset.padded_rows, 1);
        let names = dataset.feature_names.as_ref().unwrap();
        assert_eq!(names[0], "mean_mean");
        assert_eq!(dataset.label_distribution(), BTreeMap::from([(0, 1), (1, 1)]));
    }

    #[test]
    fn test_align_to_width() {
        let row = align_to_width(vec![1.0, 2.0], 5).unwrap();
        assert_eq!(row.to_vec(), vec![1.0, 2.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            align_to_width(vec![1.0; 6], 5),
            Err(ExtractError::WidthMismatch { expected: 5, actual: 6 })
        ));
    }
}
