//! Loss functions.
//!
//! Classification here always pairs a softmax output layer with cross-entropy, so the loss
//! takes *probabilities* (not logits) and integer class labels.

use crate::Matrix;

/// Mean cross-entropy over a batch.
///
/// Returns `mean_i(-ln predictions[i, targets[i]])`.
///
/// Probabilities are clamped to `f64::MIN_POSITIVE` before the log, so a softmax that
/// underflowed to exactly `0` still yields a finite loss. An empty batch has loss `0`.
pub fn cross_entropy_loss(predictions: &Matrix, targets: &[usize]) -> f64 {
    assert_eq!(
        predictions.rows(),
        targets.len(),
        "predictions rows {} do not match targets len {}",
        predictions.rows(),
        targets.len()
    );

    if targets.is_empty() {
        return 0.0;
    }

    let mut sum = 0.0_f64;
    for (i, &t) in targets.iter().enumerate() {
        sum -= predictions.get(i, t).max(f64::MIN_POSITIVE).ln();
    }
    sum / targets.len() as f64
}

/// Gradient of the mean softmax cross-entropy w.r.t. the logits.
///
/// `(predictions - one_hot(labels)) / batch_size`, reusing the `predictions` buffer.
pub fn softmax_cross_entropy_grad(mut predictions: Matrix, labels: &[usize]) -> Matrix {
    assert_eq!(
        predictions.rows(),
        labels.len(),
        "predictions rows {} do not match labels len {}",
        predictions.rows(),
        labels.len()
    );

    if labels.is_empty() {
        return predictions;
    }

    let inv_n = 1.0 / labels.len() as f64;
    for (i, &label) in labels.iter().enumerate() {
        let row = predictions.row_mut(i);
        row[label] -= 1.0;
        for v in row.iter_mut() {
            *v *= inv_n;
        }
    }
    predictions
}
