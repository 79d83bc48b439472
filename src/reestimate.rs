//!
//! Re-estimation of the model parameters (M-step of Baum-Welch)
//!
//! ```text
//! pi[i]   = gamma[i][0]
//! A[i][j] = \sum_{t<T-1} digamma[i][j][t] / \sum_{t<T-1} gamma[i][t]
//! B[i][k] = \sum_{t: x[t]=k} gamma[i][t]  / \sum_t gamma[i][t]
//! ```
//!
use crate::common::Symbol;
use crate::error::{HmmError, Result};
use crate::matrix::{StochasticMatrix, StochasticVector};
use crate::model::Model;
use crate::occupancy::Occupancy;

impl Model {
    ///
    /// Create the next parameter set from the occupancy statistics.
    ///
    /// `self` is not modified; the caller decides whether to replace the
    /// current model with the returned one.
    ///
    /// A state with zero expected occupancy (in `[0, T-1)` for A, in
    /// `[0, T)` for B) has no re-estimate and fails with
    /// `DegenerateDistribution`. In particular a single-emission sequence
    /// can never re-estimate A.
    ///
    pub fn reestimate(&self, observations: &[Symbol], occupancy: &Occupancy) -> Result<Model> {
        self.check_observations(observations)?;
        if occupancy.n_emissions() != observations.len() {
            return Err(HmmError::DimensionMismatch {
                what: "length of occupancy",
                expected: observations.len(),
                found: occupancy.n_emissions(),
            });
        }
        let n = self.n_states();
        let m = self.n_symbols();
        let gamma = occupancy.gamma();

        let pi = StochasticVector::new((0..n).map(|i| gamma[[i, 0]]).collect());

        let mut a = StochasticMatrix::zeros(n, n);
        for i in 0..n {
            let denom = occupancy.expected_departures(i);
            if denom == 0.0 {
                return Err(HmmError::DegenerateDistribution {
                    stage: "re-estimation of A",
                    at: i,
                });
            }
            for j in 0..n {
                a[(i, j)] = occupancy.expected_transitions(i, j) / denom;
            }
        }

        let mut b = StochasticMatrix::zeros(n, m);
        for i in 0..n {
            let denom: f64 = gamma.row(i).sum();
            if denom == 0.0 {
                return Err(HmmError::DegenerateDistribution {
                    stage: "re-estimation of B",
                    at: i,
                });
            }
            for (t, &symbol) in observations.iter().enumerate() {
                b[(i, symbol)] += gamma[[i, t]];
            }
            for k in 0..m {
                b[(i, k)] /= denom;
            }
        }

        Model::new(a, b, pi)
    }
}

//
// Tests
//
