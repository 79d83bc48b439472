//!
//! Backward algorithm definitions
//!
//! ```text
//! beta[i][T-1] = c[T-1]
//! beta[i][t]   = c[t] \sum_j A[i][j] B[j][x[t+1]] beta[j][t+1]     (t < T-1)
//! ```
//!
//! `c[t]` is the scaling factor computed by the scaled forward pass at the
//! same step t (not t+1). With this pairing,
//!
//! ```text
//! \sum_i alpha[i][t] beta[i][t] = c[t]
//! ```
//!
//! holds for every t, where alpha is the scaled forward matrix.
//!
use crate::common::Symbol;
use crate::error::{HmmError, Result};
use crate::forward::ScaledForward;
use crate::model::Model;
use ndarray::{Array1, Array2, ArrayView1};

///
/// Result of the scaled backward pass, an `N x T` matrix.
///
#[derive(Clone, Debug)]
pub struct ScaledBackward {
    beta: Array2<f64>,
}

impl ScaledBackward {
    pub fn beta(&self) -> &Array2<f64> {
        &self.beta
    }
    pub fn n_emissions(&self) -> usize {
        self.beta.ncols()
    }
}

impl Model {
    ///
    /// Run Backward algorithm using the scaling factors of `forward`,
    /// which must be the scaled forward result of the same observations.
    ///
    pub fn backward_scaled(
        &self,
        observations: &[Symbol],
        forward: &ScaledForward,
    ) -> Result<ScaledBackward> {
        self.check_observations(observations)?;
        if forward.n_emissions() != observations.len() {
            return Err(HmmError::DimensionMismatch {
                what: "length of scaling factors",
                expected: observations.len(),
                found: forward.n_emissions(),
            });
        }
        let n_emissions = observations.len();
        let scaling = forward.scaling();
        let mut beta = Array2::zeros((self.n_states(), n_emissions));
        beta.column_mut(n_emissions - 1).fill(scaling[n_emissions - 1]);
        for t in (0..n_emissions - 1).rev() {
            let column = self.b_step(observations[t + 1], beta.column(t + 1)) * scaling[t];
            beta.column_mut(t).assign(&column);
        }
        Ok(ScaledBackward { beta })
    }
    ///
    /// `\sum_j A[i][j] B[j][x[t+1]] beta[j][t+1]` for each i
    ///
    fn b_step(&self, next_symbol: Symbol, next: ArrayView1<f64>) -> Array1<f64> {
        let n = self.n_states();
        Array1::from_shape_fn(n, |i| {
            (0..n)
                .map(|j| self.p_trans(i, j) * self.p_emit(j, next_symbol) * next[j])
                .sum()
        })
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::*;

    ///
    /// unscaled backward, `P(x[t+1..] | state i at t)`
    ///
    fn backward_unscaled(m: &Model, obs: &[usize]) -> Array2<f64> {
        let n = m.n_states();
        let t_max = obs.len();
        let mut beta = Array2::zeros((n, t_max));
        beta.column_mut(t_max - 1).fill(1.0);
        for t in (0..t_max - 1).rev() {
            for i in 0..n {
                beta[[i, t]] = (0..n)
                    .map(|j| m.p_trans(i, j) * m.p_emit(j, obs[t + 1]) * beta[[j, t + 1]])
                    .sum();
            }
        }
        beta
    }

    #[test]
    fn backward_scaling_uses_same_step_factor() {
        let m = mock_two_state();
        let obs = vec![0, 1, 0];
        let f = m.forward_scaled(&obs).unwrap();
        let b = m.backward_scaled(&obs, &f).unwrap();
        let c = f.scaling();
        let beta = b.beta();

        // last column is c[T-1]
        assert_eq!(beta[[0, 2]], c[2]);
        assert_eq!(beta[[1, 2]], c[2]);

        // t=1 is scaled by c[1]
        for i in 0..2 {
            let s: f64 = (0..2)
                .map(|j| m.p_trans(i, j) * m.p_emit(j, obs[2]) * beta[[j, 2]])
                .sum();
            assert_abs_diff_eq!(beta[[i, 1]], c[1] * s, epsilon = 1e-15);
        }
        // t=0 is scaled by c[0]
        for i in 0..2 {
            let s: f64 = (0..2)
                .map(|j| m.p_trans(i, j) * m.p_emit(j, obs[1]) * beta[[j, 1]])
                .sum();
            assert_abs_diff_eq!(beta[[i, 0]], c[0] * s, epsilon = 1e-15);
        }
    }
    #[test]
    fn backward_scaled_matches_unscaled_times_suffix_factors() {
        let m = mock_irregular();
        let obs = vec![1, 3, 0, 0, 2, 3];
        let f = m.forward_scaled(&obs).unwrap();
        let b = m.backward_scaled(&obs, &f).unwrap();
        let beta = backward_unscaled(&m, &obs);
        for t in 0..obs.len() {
            let suffix: f64 = (t..obs.len()).map(|s| f.scaling()[s]).product();
            for i in 0..m.n_states() {
                assert_relative_eq!(b.beta()[[i, t]], beta[[i, t]] * suffix, max_relative = 1e-12);
            }
        }
    }
    #[test]
    fn backward_alpha_beta_identity() {
        let m = mock_three_state();
        let obs = vec![0, 1, 1, 2, 0, 0, 2, 1];
        let f = m.forward_scaled(&obs).unwrap();
        let b = m.backward_scaled(&obs, &f).unwrap();
        for t in 0..obs.len() {
            let s: f64 = (0..m.n_states())
                .map(|i| f.alpha()[[i, t]] * b.beta()[[i, t]])
                .sum();
            assert_relative_eq!(s, f.scaling()[t], max_relative = 1e-12);
        }
    }
    #[test]
    fn backward_single_emission() {
        let m = mock_two_state();
        let f = m.forward_scaled(&[1]).unwrap();
        let b = m.backward_scaled(&[1], &f).unwrap();
        assert_eq!(b.n_emissions(), 1);
        assert_eq!(b.beta()[[0, 0]], f.scaling()[0]);
    }
    #[test]
    fn backward_rejects_unpaired_forward() {
        let m = mock_two_state();
        let f = m.forward_scaled(&[0, 1, 0]).unwrap();
        let e = m.backward_scaled(&[0, 1], &f).unwrap_err();
        assert!(e.is_dimension_mismatch());
    }
}
