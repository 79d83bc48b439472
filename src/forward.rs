//!
//! Forward algorithm definitions
//!
//! ```text
//! alpha[i][0] = B[i][x[0]] pi[i]
//! alpha[i][t] = B[i][x[t]] \sum_j A[j][i] alpha[j][t-1]     (t >= 1)
//!
//! P(x) = \sum_i alpha[i][T-1]
//! ```
//!
//! The scaled variant normalizes each column right after it is computed,
//!
//! ```text
//! c[t] = 1 / \sum_i alpha[i][t]
//! alpha[i][t] <- c[t] alpha[i][t]
//! ```
//!
//! so that `log P(x) = - \sum_t log c[t]`.
//!
use crate::common::Symbol;
use crate::error::{HmmError, Result};
use crate::model::Model;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

///
/// Base of the logarithm used to report log-likelihoods.
///
/// The stopping rule of training compares log-likelihoods only by order,
/// so the choice of base does not change the trained model.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogBase {
    /// natural logarithm `ln`
    Natural,
    /// `log2`
    Two,
    /// `log10`
    Ten,
}

impl LogBase {
    ///
    /// Convert a natural logarithm `ln(x)` into the logarithm of this base.
    ///
    pub fn convert_ln(self, ln_x: f64) -> f64 {
        match self {
            LogBase::Natural => ln_x,
            LogBase::Two => ln_x / std::f64::consts::LN_2,
            LogBase::Ten => ln_x / std::f64::consts::LN_10,
        }
    }
    ///
    /// Inverse of the logarithm, `base^x`.
    ///
    pub fn pow(self, x: f64) -> f64 {
        match self {
            LogBase::Natural => x.exp(),
            LogBase::Two => x.exp2(),
            LogBase::Ten => 10f64.powf(x),
        }
    }
}

impl Default for LogBase {
    fn default() -> Self {
        LogBase::Natural
    }
}

impl std::fmt::Display for LogBase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogBase::Natural => write!(f, "e"),
            LogBase::Two => write!(f, "2"),
            LogBase::Ten => write!(f, "10"),
        }
    }
}

impl std::str::FromStr for LogBase {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "e" | "ln" | "natural" => Ok(LogBase::Natural),
            "2" => Ok(LogBase::Two),
            "10" => Ok(LogBase::Ten),
            _ => Err(format!("unknown log base `{}` (use e, 2 or 10)", s)),
        }
    }
}

///
/// Result of the unscaled forward pass
///
/// `alpha[[i, t]] = P(x[0..=t], state i at t)`, an `N x T` matrix.
///
#[derive(Clone, Debug)]
pub struct Forward {
    alpha: Array2<f64>,
}

impl Forward {
    pub fn alpha(&self) -> &Array2<f64> {
        &self.alpha
    }
    /// Length T of the observation sequence
    pub fn n_emissions(&self) -> usize {
        self.alpha.ncols()
    }
    ///
    /// `P(x) = \sum_i alpha[i][T-1]`
    ///
    pub fn full_prob(&self) -> f64 {
        self.alpha.column(self.n_emissions() - 1).sum()
    }
}

///
/// Per-step scaling factors `c[t]` of the scaled forward pass.
///
/// Each `c[t]` is the reciprocal of the column sum of alpha at step t,
/// so every value is positive and finite.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ScalingFactors(Vec<f64>);

impl ScalingFactors {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
    ///
    /// `ln P(x) = - \sum_t ln c[t]`
    ///
    pub fn ln_prob(&self) -> f64 {
        -self.0.iter().map(|&c| c.ln()).sum::<f64>()
    }
    ///
    /// `log P(x)` in the given base.
    ///
    pub fn log_prob(&self, base: LogBase) -> f64 {
        base.convert_ln(self.ln_prob())
    }
}

impl std::ops::Index<usize> for ScalingFactors {
    type Output = f64;
    fn index(&self, t: usize) -> &f64 {
        &self.0[t]
    }
}

///
/// Result of the scaled forward pass
///
/// The alpha matrix and the scaling factors always come from the same run,
/// and the backward pass takes this struct as a whole.
///
#[derive(Clone, Debug)]
pub struct ScaledForward {
    alpha: Array2<f64>,
    scaling: ScalingFactors,
}

impl ScaledForward {
    ///
    /// Scaled alpha. Every column sums to one.
    ///
    pub fn alpha(&self) -> &Array2<f64> {
        &self.alpha
    }
    pub fn scaling(&self) -> &ScalingFactors {
        &self.scaling
    }
    pub fn n_emissions(&self) -> usize {
        self.alpha.ncols()
    }
    pub fn log_prob(&self, base: LogBase) -> f64 {
        self.scaling.log_prob(base)
    }
}

// wrappers and exposed functions
impl Model {
    ///
    /// Run Forward algorithm to the observations, without scaling.
    ///
    /// Long sequences underflow to zero; use `forward_scaled` for those.
    ///
    pub fn forward(&self, observations: &[Symbol]) -> Result<Forward> {
        self.check_observations(observations)?;
        let mut alpha = Array2::zeros((self.n_states(), observations.len()));
        for (t, &symbol) in observations.iter().enumerate() {
            let column = if t == 0 {
                self.f_init(symbol)
            } else {
                self.f_step(symbol, alpha.column(t - 1))
            };
            alpha.column_mut(t).assign(&column);
        }
        Ok(Forward { alpha })
    }
    ///
    /// Run Forward algorithm with per-step normalization.
    ///
    /// Fails with `DegenerateDistribution` if a column sums to zero, i.e.
    /// no state can emit the symbol observed at that step.
    ///
    pub fn forward_scaled(&self, observations: &[Symbol]) -> Result<ScaledForward> {
        self.check_observations(observations)?;
        let mut alpha = Array2::zeros((self.n_states(), observations.len()));
        let mut scaling = Vec::with_capacity(observations.len());
        for (t, &symbol) in observations.iter().enumerate() {
            let mut column = if t == 0 {
                self.f_init(symbol)
            } else {
                self.f_step(symbol, alpha.column(t - 1))
            };
            let sum = column.sum();
            let c = 1.0 / sum;
            if sum == 0.0 || !c.is_finite() {
                debug!("forward column t={} sums to {}", t, sum);
                return Err(HmmError::DegenerateDistribution {
                    stage: "scaled forward",
                    at: t,
                });
            }
            column *= c;
            alpha.column_mut(t).assign(&column);
            scaling.push(c);
        }
        Ok(ScaledForward {
            alpha,
            scaling: ScalingFactors(scaling),
        })
    }
    ///
    /// `log P(x)` computed through the scaled forward pass.
    ///
    pub fn log_likelihood(&self, observations: &[Symbol], base: LogBase) -> Result<f64> {
        Ok(self.forward_scaled(observations)?.log_prob(base))
    }
    ///
    /// `alpha[i][0] = B[i][x[0]] pi[i]`
    ///
    fn f_init(&self, symbol: Symbol) -> Array1<f64> {
        Array1::from_shape_fn(self.n_states(), |i| {
            self.p_emit(i, symbol) * self.p_init(i)
        })
    }
    ///
    /// `alpha[i][t] = B[i][x[t]] \sum_j A[j][i] alpha[j][t-1]`
    ///
    fn f_step(&self, symbol: Symbol, prev: ArrayView1<f64>) -> Array1<f64> {
        let n = self.n_states();
        Array1::from_shape_fn(n, |i| {
            let from_prev: f64 = (0..n).map(|j| self.p_trans(j, i) * prev[j]).sum();
            self.p_emit(i, symbol) * from_prev
        })
    }
}

//
// Tests
//
