//! Activation functions.
//!
//! The hidden layer computes a pre-activation `z = x·W + b` and applies ReLU element-wise;
//! the output layer turns logits into class probabilities with a row-wise softmax.
//!
//! Unlike a cached-output formulation, backprop here evaluates the ReLU derivative on the
//! cached *pre-activation* `z`, so the subgradient at exactly `0` is `0`.

use crate::Matrix;

/// Row-wise softmax.
///
/// Each row has its maximum subtracted before exponentiating, so large logits never
/// overflow. Output rows sum to 1 and every entry is strictly positive for finite input.
pub fn softmax(logits: &Matrix) -> Matrix {
    let mut out = logits.clone();
    for r in 0..out.rows() {
        softmax_row_inplace(out.row_mut(r));
    }
    out
}

/// Softmax over a single row, in place.
pub fn softmax_row_inplace(row: &mut [f64]) {
    if row.is_empty() {
        return;
    }
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0_f64;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    let inv_sum = 1.0 / sum;
    for v in row.iter_mut() {
        *v *= inv_sum;
    }
}

/// Rectified linear unit.
///
/// - `derivative == false`: `max(0, x)` element-wise.
/// - `derivative == true`: `1` where `x > 0`, else `0`.
pub fn relu(x: &Matrix, derivative: bool) -> Matrix {
    if derivative {
        x.map(|v| if v > 0.0 { 1.0 } else { 0.0 })
    } else {
        x.map(|v| v.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(values: &[f64]) -> Matrix {
        Matrix::from_flat(1, values.len(), values.to_vec()).unwrap()
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let logits = Matrix::from_flat(2, 3, vec![1.0, 2.0, 3.0, -4.0, 0.0, 10.0]).unwrap();
        let p = softmax(&logits);
        for r in 0..p.rows() {
            let sum: f64 = p.row(r).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn softmax_is_shift_invariant() {
        let a = softmax(&row(&[0.3, -1.2, 2.5, 0.0]));
        let b = softmax(&row(&[100.3, 98.8, 102.5, 100.0]));
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn softmax_survives_extreme_logits() {
        let p = softmax(&row(&[1000.0, -1000.0, 999.0]));
        assert!(p.is_finite());
        assert!(p.as_slice().iter().all(|&v| v >= 0.0));
        assert!(p.get(0, 0) > p.get(0, 2));
    }

    #[test]
    fn relu_and_its_derivative() {
        let x = row(&[-2.0, 0.0, 0.5, 3.0]);
        assert_eq!(relu(&x, false).as_slice(), &[0.0, 0.0, 0.5, 3.0]);
        // Subgradient at 0 is 0.
        assert_eq!(relu(&x, true).as_slice(), &[0.0, 0.0, 1.0, 1.0]);
    }
}
