//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop).

use crate::Matrix;

/// Index of the largest value; the lowest index wins ties.
///
/// Returns `0` for an empty slice.
#[inline]
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Fraction of rows whose argmax equals the label, in `[0, 1]`.
///
/// An empty batch has accuracy `0`.
pub fn accuracy(predictions: &Matrix, labels: &[usize]) -> f64 {
    assert_eq!(
        predictions.rows(),
        labels.len(),
        "predictions rows {} do not match labels len {}",
        predictions.rows(),
        labels.len()
    );

    if labels.is_empty() {
        return 0.0;
    }

    let correct = labels
        .iter()
        .enumerate()
        .filter(|&(i, &label)| argmax(predictions.row(i)) == label)
        .count();
    correct as f64 / labels.len() as f64
}
