//! Labelled datasets.
//!
//! A `Dataset` is a feature matrix `(n_samples, n_features)` plus one integer class label per
//! row. The upstream pipeline (CSV ingestion, cleaning, balancing, label encoding) produces
//! these; the engine only needs them validated and dense.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};

use crate::{Error, Matrix, Result};

/// Fraction of rows held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;

/// Features (X) and class labels (y), row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix,
    labels: Vec<usize>,
}

impl Dataset {
    /// Pair a feature matrix with its labels.
    ///
    /// Fails with `InvalidShape` if the row count differs from the label count or either is
    /// empty, and with `InvalidData` if any feature is not finite.
    pub fn new(features: Matrix, labels: Vec<usize>) -> Result<Self> {
        if features.rows() == 0 || labels.is_empty() {
            return Err(Error::InvalidShape(
                "dataset must contain at least one row and one label".to_owned(),
            ));
        }
        if features.rows() != labels.len() {
            return Err(Error::InvalidShape(format!(
                "feature rows {} do not match label count {}",
                features.rows(),
                labels.len()
            )));
        }
        if features.cols() == 0 {
            return Err(Error::InvalidShape(
                "features must have at least one column".to_owned(),
            ));
        }
        if !features.is_finite() {
            return Err(Error::InvalidData(
                "features must contain only finite values".to_owned(),
            ));
        }
        Ok(Self { features, labels })
    }

    /// Convenience constructor from per-sample rows.
    pub fn from_rows(rows: &[Vec<f64>], labels: &[usize]) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(Error::InvalidShape(format!(
                "feature rows {} do not match label count {}",
                rows.len(),
                labels.len()
            )));
        }
        Self::new(Matrix::from_rows(rows)?, labels.to_vec())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.cols()
    }

    #[inline]
    pub fn features(&self) -> &Matrix {
        &self.features
    }

    #[inline]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of distinct labels present.
    pub fn n_classes(&self) -> usize {
        let mut seen = self.labels.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Size of the largest class divided by the dataset size.
    ///
    /// This is the accuracy of always predicting the most frequent class.
    pub fn majority_fraction(&self) -> f64 {
        let mut sorted = self.labels.clone();
        sorted.sort_unstable();
        let top = sorted
            .chunk_by(|a, b| a == b)
            .map(<[usize]>::len)
            .max()
            .unwrap_or(0);
        top as f64 / self.len().max(1) as f64
    }

    /// Random train/test partition.
    ///
    /// The test side gets `ceil(len * test_fraction)` rows. Both sides must be non-empty.
    pub fn split<R: Rng + ?Sized>(&self, test_fraction: f64, rng: &mut R) -> Result<(Self, Self)> {
        if !(test_fraction.is_finite() && test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "test fraction must be in (0, 1), got {test_fraction}"
            )));
        }
        let n_test = (self.len() as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= self.len() {
            return Err(Error::InvalidShape(format!(
                "{} rows cannot be split into non-empty train and test partitions",
                self.len()
            )));
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        let (test_idx, train_idx) = order.split_at(n_test);

        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    /// Reorder rows in place, applying one permutation to both features and labels.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        *self = self.subset(&order);
    }

    /// Copies rows `start..end` as a `(features, labels)` batch.
    pub fn batch(&self, start: usize, end: usize) -> (Matrix, &[usize]) {
        (self.features.slice_rows(start, end), &self.labels[start..end])
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select_rows(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Gaussian blobs: `n_per_class` rows around one random center per class.
    ///
    /// Centers are drawn uniformly from `[-spread, spread]^n_features` and points get
    /// `N(0, noise)` jitter. Handy for smoke tests and the CLI demo.
    pub fn gaussian_blobs<R: Rng + ?Sized>(
        n_classes: usize,
        n_per_class: usize,
        n_features: usize,
        spread: f64,
        noise: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if n_classes == 0 || n_per_class == 0 || n_features == 0 {
            return Err(Error::InvalidConfig(
                "blob counts and feature dimension must be > 0".to_owned(),
            ));
        }
        let jitter = Normal::new(0.0, noise)
            .map_err(|e| Error::InvalidConfig(format!("invalid blob noise {noise}: {e}")))?;

        let mut rows = Vec::with_capacity(n_classes * n_per_class);
        let mut labels = Vec::with_capacity(n_classes * n_per_class);
        for class in 0..n_classes {
            let center: Vec<f64> = (0..n_features)
                .map(|_| rng.gen_range(-spread..=spread))
                .collect();
            for _ in 0..n_per_class {
                rows.push(center.iter().map(|c| c + jitter.sample(rng)).collect());
                labels.push(class);
            }
        }
        Self::from_rows(&rows, &labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn toy(n: usize) -> Dataset {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, -(i as f64)]).collect();
        let labels: Vec<usize> = (0..n).map(|i| i % 3).collect();
        Dataset::from_rows(&rows, &labels).unwrap()
    }

    #[test]
    fn rejects_mismatched_and_empty_inputs() {
        let features = Matrix::zeros(10, 2);
        let err = Dataset::new(features, vec![0; 9]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));

        let err = Dataset::new(Matrix::zeros(0, 2), vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
    }

    #[test]
    fn rejects_non_finite_features() {
        let features = Matrix::from_flat(1, 2, vec![1.0, f64::NAN]).unwrap();
        let err = Dataset::new(features, vec![0]).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn split_is_eighty_twenty_and_disjoint() {
        let data = toy(10);
        let mut rng = StdRng::seed_from_u64(7);
        let (train, test) = data.split(TEST_FRACTION, &mut rng).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let mut firsts: Vec<i64> = train
            .features()
            .as_slice()
            .chunks(2)
            .chain(test.features().as_slice().chunks(2))
            .map(|r| r[0] as i64)
            .collect();
        firsts.sort_unstable();
        assert_eq!(firsts, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn split_rounds_test_size_up() {
        let data = toy(7);
        let mut rng = StdRng::seed_from_u64(0);
        let (train, test) = data.split(TEST_FRACTION, &mut rng).unwrap();
        assert_eq!((train.len(), test.len()), (5, 2));
    }

    #[test]
    fn single_row_cannot_be_split() {
        let data = toy(1);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            data.split(TEST_FRACTION, &mut rng),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn shuffle_keeps_rows_paired_with_labels() {
        let mut data = toy(30);
        let mut rng = StdRng::seed_from_u64(3);
        data.shuffle(&mut rng);
        for i in 0..data.len() {
            let original_idx = data.features().get(i, 0) as usize;
            assert_eq!(data.labels()[i], original_idx % 3);
            assert_eq!(data.features().get(i, 1), -(original_idx as f64));
        }
    }

    #[test]
    fn blobs_have_requested_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let data = Dataset::gaussian_blobs(3, 100, 4, 5.0, 0.5, &mut rng).unwrap();
        assert_eq!(data.len(), 300);
        assert_eq!(data.n_features(), 4);
        assert_eq!(data.n_classes(), 3);
        assert!((data.majority_fraction() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn majority_fraction_handles_sparse_label_values() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let data = Dataset::from_rows(&rows, &[0, usize::MAX, usize::MAX, 7]).unwrap();
        assert_eq!(data.n_classes(), 3);
        assert_eq!(data.majority_fraction(), 0.5);
    }
}
