//!
//! State and transition occupancy (gamma and di-gamma)
//!
//! For `t = 0, ..., T-2`
//!
//! ```text
//! digamma[i][j][t] = alpha[i][t] A[i][j] B[j][x[t+1]] beta[j][t+1] / denom[t]
//! denom[t]         = \sum_{i,j} alpha[i][t] A[i][j] B[j][x[t+1]] beta[j][t+1]
//! gamma[i][t]      = \sum_j digamma[i][j][t]
//! ```
//!
//! and for the final step
//!
//! ```text
//! gamma[i][T-1] = alpha[i][T-1] / \sum_k alpha[k][T-1]
//! ```
//!
//! alpha and beta are the scaled forward and backward matrices.
//!
use crate::backward::ScaledBackward;
use crate::common::{State, Symbol};
use crate::error::{HmmError, Result};
use crate::forward::ScaledForward;
use crate::model::Model;
use ndarray::{Array2, Array3};

///
/// Posterior state occupancy `gamma` (`N x T`) and transition occupancy
/// `digamma` (`N x N x (T-1)`, no transition leaves the last step).
///
#[derive(Clone, Debug)]
pub struct Occupancy {
    gamma: Array2<f64>,
    digamma: Array3<f64>,
}

impl Occupancy {
    ///
    /// `gamma[[i, t]] = P(state i at t | x)`
    ///
    pub fn gamma(&self) -> &Array2<f64> {
        &self.gamma
    }
    ///
    /// `digamma[[i, j, t]] = P(state i at t, state j at t+1 | x)`
    ///
    pub fn digamma(&self) -> &Array3<f64> {
        &self.digamma
    }
    pub fn n_emissions(&self) -> usize {
        self.gamma.ncols()
    }
    ///
    /// Expected number of visits of state i over `t` in `[0, T-1)`
    ///
    pub fn expected_departures(&self, i: State) -> f64 {
        let n_emissions = self.n_emissions();
        (0..n_emissions - 1).map(|t| self.gamma[[i, t]]).sum()
    }
    ///
    /// Expected number of transitions from i to j
    ///
    pub fn expected_transitions(&self, i: State, j: State) -> f64 {
        let n_emissions = self.n_emissions();
        (0..n_emissions - 1).map(|t| self.digamma[[i, j, t]]).sum()
    }
}

impl Model {
    ///
    /// Calculate gamma and di-gamma from the scaled forward and backward
    /// results of the same observations.
    ///
    pub fn occupancy(
        &self,
        observations: &[Symbol],
        forward: &ScaledForward,
        backward: &ScaledBackward,
    ) -> Result<Occupancy> {
        self.check_observations(observations)?;
        let n = self.n_states();
        let n_emissions = observations.len();
        for &found in [forward.n_emissions(), backward.n_emissions()].iter() {
            if found != n_emissions {
                return Err(HmmError::DimensionMismatch {
                    what: "length of forward/backward tables",
                    expected: n_emissions,
                    found,
                });
            }
        }
        let alpha = forward.alpha();
        let beta = backward.beta();
        let mut gamma = Array2::zeros((n, n_emissions));
        let mut digamma = Array3::zeros((n, n, n_emissions - 1));

        for t in 0..n_emissions - 1 {
            let next_symbol = observations[t + 1];
            for i in 0..n {
                for j in 0..n {
                    digamma[[i, j, t]] = alpha[[i, t]]
                        * self.p_trans(i, j)
                        * self.p_emit(j, next_symbol)
                        * beta[[j, t + 1]];
                }
            }
            let denom: f64 = digamma.index_axis(ndarray::Axis(2), t).sum();
            if denom == 0.0 {
                return Err(HmmError::DegenerateDistribution {
                    stage: "di-gamma",
                    at: t,
                });
            }
            for i in 0..n {
                for j in 0..n {
                    digamma[[i, j, t]] /= denom;
                    gamma[[i, t]] += digamma[[i, j, t]];
                }
            }
        }

        let last = n_emissions - 1;
        let denom = alpha.column(last).sum();
        if denom == 0.0 {
            return Err(HmmError::DegenerateDistribution {
                stage: "gamma",
                at: last,
            });
        }
        for i in 0..n {
            gamma[[i, last]] = alpha[[i, last]] / denom;
        }

        Ok(Occupancy { gamma, digamma })
    }
}

//
// Tests
//
