//!
//! Row-stochastic matrix and vector primitives
//!
//! These are plain data. All HMM passes read them by index and never keep
//! a reference to them after returning.
//!
use crate::error::{HmmError, Result};
use approx::AbsDiffEq;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

///
/// Tolerance used when checking that re-estimated rows still sum to one.
///
pub const STOCHASTIC_TOLERANCE: f64 = 1e-9;

///
/// Number of elements `rows * cols`, or a parse error if it overflows.
///
pub fn matrix_size(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| HmmError::Parse(format!("matrix size {} x {} overflows", rows, cols)))
}

///
/// `rows x cols` matrix of probabilities, stored row-major.
///
/// In a valid HMM every row of A and B sums to one, but the type itself
/// does not enforce it. Use `check_stochastic` when the input is untrusted.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StochasticMatrix(Array2<f64>);

impl StochasticMatrix {
    ///
    /// Create from a row-major flat vector of `rows * cols` values.
    ///
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let size = matrix_size(rows, cols)?;
        if values.len() != size {
            return Err(HmmError::DimensionMismatch {
                what: "matrix values",
                expected: size,
                found: values.len(),
            });
        }
        Array2::from_shape_vec((rows, cols), values)
            .map(StochasticMatrix)
            .map_err(|e| HmmError::Parse(e.to_string()))
    }
    ///
    /// Create from nested rows. All rows must have the same length.
    ///
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |row| row.len());
        if let Some(row) = rows.iter().find(|row| row.len() != n_cols) {
            return Err(HmmError::DimensionMismatch {
                what: "matrix row length",
                expected: n_cols,
                found: row.len(),
            });
        }
        StochasticMatrix::new(n_rows, n_cols, rows.into_iter().flatten().collect())
    }
    ///
    /// Matrix filled with zeros.
    ///
    pub fn zeros(rows: usize, cols: usize) -> Self {
        StochasticMatrix(Array2::zeros((rows, cols)))
    }
    ///
    /// Matrix whose rows are uniform distributions over `cols` items.
    ///
    pub fn uniform(rows: usize, cols: usize) -> Self {
        StochasticMatrix(Array2::from_elem((rows, cols), 1.0 / cols as f64))
    }
    ///
    /// Matrix whose rows are random distributions close to uniform.
    ///
    /// Exactly uniform rows are a fixed point of Baum-Welch, so an initial
    /// guess should be perturbed like this.
    ///
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let mut m = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(0.5..1.5));
        for mut row in m.rows_mut() {
            let sum = row.sum();
            row.mapv_inplace(|x| x / sum);
        }
        StochasticMatrix(m)
    }
    pub fn n_rows(&self) -> usize {
        self.0.nrows()
    }
    pub fn n_cols(&self) -> usize {
        self.0.ncols()
    }
    ///
    /// view of the i-th row
    ///
    pub fn row(&self, i: usize) -> ArrayView1<f64> {
        self.0.row(i)
    }
    ///
    /// Sum of each row.
    ///
    pub fn row_sums(&self) -> Vec<f64> {
        self.0.sum_axis(Axis(1)).to_vec()
    }
    ///
    /// Check all rows sum to one within `tol`.
    ///
    pub fn is_row_stochastic(&self, tol: f64) -> bool {
        self.row_sums()
            .iter()
            .all(|&sum| abs_diff_eq!(sum, 1.0, epsilon = tol))
    }
    ///
    /// Check all rows sum to one within `tol`, reporting the first bad row.
    ///
    pub fn check_stochastic(&self, what: &'static str, tol: f64) -> Result<()> {
        match self
            .row_sums()
            .into_iter()
            .enumerate()
            .find(|&(_, sum)| !abs_diff_eq!(sum, 1.0, epsilon = tol))
        {
            Some((row, sum)) => Err(HmmError::NotStochastic { what, row, sum }),
            None => Ok(()),
        }
    }
    ///
    /// Plain matrix product `self * other`.
    ///
    pub fn dot(&self, other: &StochasticMatrix) -> Result<StochasticMatrix> {
        if self.n_cols() != other.n_rows() {
            return Err(HmmError::DimensionMismatch {
                what: "matrix product",
                expected: self.n_cols(),
                found: other.n_rows(),
            });
        }
        Ok(StochasticMatrix(self.0.dot(&other.0)))
    }
    ///
    /// Iterator over the values in row-major order.
    ///
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
    pub fn as_array(&self) -> &Array2<f64> {
        &self.0
    }
}

impl From<Array2<f64>> for StochasticMatrix {
    fn from(array: Array2<f64>) -> Self {
        StochasticMatrix(array)
    }
}

impl std::ops::Index<(usize, usize)> for StochasticMatrix {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.0[[i, j]]
    }
}

impl std::ops::IndexMut<(usize, usize)> for StochasticMatrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.0[[i, j]]
    }
}

/// for approx `assert_abs_diff_eq`
impl AbsDiffEq for StochasticMatrix {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.0.shape() == other.0.shape()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| f64::abs_diff_eq(a, b, epsilon))
    }
}

impl std::fmt::Display for StochasticMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.0.rows() {
            for (j, x) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{:.4}", x)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

///
/// Probability vector of length N, e.g. the initial state distribution.
///
/// In the text format it is encoded as a `1 x N` matrix.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StochasticVector(Array1<f64>);

impl StochasticVector {
    pub fn new(values: Vec<f64>) -> Self {
        StochasticVector(Array1::from(values))
    }
    pub fn uniform(n: usize) -> Self {
        StochasticVector(Array1::from_elem(n, 1.0 / n as f64))
    }
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let m = StochasticMatrix::random(1, n, rng);
        StochasticVector(m.0.row(0).to_owned())
    }
    ///
    /// Convert `1 x N` matrix into a vector.
    ///
    pub fn from_matrix(m: &StochasticMatrix) -> Result<Self> {
        if m.n_rows() != 1 {
            return Err(HmmError::DimensionMismatch {
                what: "vector rows",
                expected: 1,
                found: m.n_rows(),
            });
        }
        Ok(StochasticVector(m.0.row(0).to_owned()))
    }
    ///
    /// Convert into `1 x N` matrix.
    ///
    pub fn to_matrix(&self) -> StochasticMatrix {
        StochasticMatrix(self.0.clone().insert_axis(Axis(0)))
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn sum(&self) -> f64 {
        self.0.sum()
    }
    pub fn check_stochastic(&self, what: &'static str, tol: f64) -> Result<()> {
        self.to_matrix().check_stochastic(what, tol)
    }
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for StochasticVector {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl std::ops::IndexMut<usize> for StochasticVector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl AbsDiffEq for StochasticVector {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| f64::abs_diff_eq(a, b, epsilon))
    }
}
