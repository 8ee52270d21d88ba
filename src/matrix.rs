//! Row-major dense matrix.
//!
//! `Matrix` is the only tensor type the engine needs: feature batches, weight matrices and
//! activations are all 2D. Biases are plain `Vec<f64>` rows broadcast over a batch.

use crate::matmul::gemm_f64;
use crate::{Error, Result};

/// A `rows × cols` matrix stored contiguously in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from a flat row-major buffer.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::InvalidShape("matrix shape overflow".to_owned()))?;
        if data.len() != expected {
            return Err(Error::InvalidShape(format!(
                "buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from per-sample rows (copies into contiguous storage).
    ///
    /// An empty slice yields a `0 × 0` matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidShape(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Returns row `idx`. Panics if `idx >= rows`.
    #[inline]
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, idx: usize) -> &mut [f64] {
        let start = idx * self.cols;
        &mut self.data[start..start + self.cols]
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Copies the rows `start..end` into a new matrix.
    pub fn slice_rows(&self, start: usize, end: usize) -> Matrix {
        assert!(
            start <= end && end <= self.rows,
            "row range {start}..{end} out of bounds for {} rows",
            self.rows
        );
        Matrix {
            rows: end - start,
            cols: self.cols,
            data: self.data[start * self.cols..end * self.cols].to_vec(),
        }
    }

    /// Gathers the given rows, in order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// Element-wise map into a new matrix of the same shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// `self · rhs`.
    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, rhs.rows,
            "matmul shape mismatch: ({}, {}) · ({}, {})",
            self.rows, self.cols, rhs.rows, rhs.cols
        );
        let mut out = Matrix::zeros(self.rows, rhs.cols);
        gemm_f64(
            self.rows,
            rhs.cols,
            self.cols,
            1.0,
            &self.data,
            self.cols,
            1,
            &rhs.data,
            rhs.cols,
            1,
            0.0,
            &mut out.data,
            rhs.cols,
            1,
        );
        out
    }

    /// `selfᵀ · rhs` without materializing the transpose.
    pub fn t_matmul(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(
            self.rows, rhs.rows,
            "t_matmul shape mismatch: ({}, {})ᵀ · ({}, {})",
            self.rows, self.cols, rhs.rows, rhs.cols
        );
        let mut out = Matrix::zeros(self.cols, rhs.cols);
        gemm_f64(
            self.cols,
            rhs.cols,
            self.rows,
            1.0,
            &self.data,
            1,
            self.cols,
            &rhs.data,
            rhs.cols,
            1,
            0.0,
            &mut out.data,
            rhs.cols,
            1,
        );
        out
    }

    /// `self · rhsᵀ` without materializing the transpose.
    pub fn matmul_t(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, rhs.cols,
            "matmul_t shape mismatch: ({}, {}) · ({}, {})ᵀ",
            self.rows, self.cols, rhs.rows, rhs.cols
        );
        let mut out = Matrix::zeros(self.rows, rhs.rows);
        gemm_f64(
            self.rows,
            rhs.rows,
            self.cols,
            1.0,
            &self.data,
            self.cols,
            1,
            &rhs.data,
            1,
            rhs.cols,
            0.0,
            &mut out.data,
            rhs.rows,
            1,
        );
        out
    }

    /// Adds `bias` to every row in place.
    pub fn add_row_inplace(&mut self, bias: &[f64]) {
        assert_eq!(
            bias.len(),
            self.cols,
            "bias len {} does not match cols {}",
            bias.len(),
            self.cols
        );
        for row in self.data.chunks_exact_mut(self.cols.max(1)) {
            for (v, &b) in row.iter_mut().zip(bias) {
                *v += b;
            }
        }
    }

    /// Column sums (sum over rows), length `cols`.
    pub fn sum_rows(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.cols];
        for row in self.data.chunks_exact(self.cols.max(1)) {
            for (acc, &v) in out.iter_mut().zip(row) {
                *acc += v;
            }
        }
        out
    }

    /// Element-wise product in place.
    pub fn hadamard_inplace(&mut self, rhs: &Matrix) {
        assert_eq!(self.shape(), rhs.shape(), "hadamard shape mismatch");
        for (a, &b) in self.data.iter_mut().zip(&rhs.data) {
            *a *= b;
        }
    }

    /// `self -= scale * rhs`.
    pub fn sub_scaled_inplace(&mut self, rhs: &Matrix, scale: f64) {
        assert_eq!(self.shape(), rhs.shape(), "update shape mismatch");
        sub_scaled(&mut self.data, &rhs.data, scale);
    }

    /// True when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// `dst -= scale * src` over two equal-length slices.
#[inline]
pub(crate) fn sub_scaled(dst: &mut [f64], src: &[f64], scale: f64) {
    assert_eq!(dst.len(), src.len(), "update length mismatch");
    for (d, &s) in dst.iter_mut().zip(src) {
        *d -= scale * s;
    }
}
