//!
//! Viterbi algorithm definitions
//!
//! ```text
//! delta[i][0] = B[i][x[0]] pi[i]
//! delta[i][t] = max_j A[j][i] delta[j][t-1] B[i][x[t]]     (t >= 1)
//! ```
//!
//! ## Backpointers
//!
//! The best predecessor of `(i, t)` is stored one step behind, at
//! `backpointers[i][t-1]`. The last column `backpointers[.][T-1]` is filled
//! with the terminal state, so the path is read by
//!
//! ```text
//! path[T-1] = backpointers[0][T-1]
//! path[t]   = backpointers[path[t+1]][t]
//! ```
//!
//! ## Ties
//!
//! * propagation: `>=`, the later-indexed predecessor wins
//! * termination: `>`, the lowest-indexed terminal state wins
//!
//! The two rules are intentionally not unified.
//!
//! There is no scaling, so very long sequences underflow to zero and are
//! reported as `NoValidPath`.
//!
use crate::common::{State, StatePath, Symbol};
use crate::error::{HmmError, Result};
use crate::model::Model;
use log::debug;
use ndarray::{Array2, ArrayView1};

///
/// Tables filled by the Viterbi pass
///
#[derive(Clone, Debug)]
pub struct ViterbiTable {
    /// `N x T` best-path probabilities
    delta: Array2<f64>,
    /// `N x T` predecessor indices, offset by one step
    backpointers: Array2<State>,
    /// state with the highest final best-path probability
    terminal: State,
}

impl ViterbiTable {
    pub fn delta(&self) -> &Array2<f64> {
        &self.delta
    }
    pub fn backpointers(&self) -> &Array2<State> {
        &self.backpointers
    }
    pub fn terminal(&self) -> State {
        self.terminal
    }
    pub fn n_emissions(&self) -> usize {
        self.delta.ncols()
    }
    ///
    /// Joint probability of the most likely path and the observations.
    ///
    pub fn best_prob(&self) -> f64 {
        self.delta[[self.terminal, self.n_emissions() - 1]]
    }
    ///
    /// Reconstruct the most likely path by following the backpointers
    /// from the end.
    ///
    pub fn path(&self) -> StatePath {
        let n_emissions = self.n_emissions();
        let mut path = vec![0; n_emissions];
        path[n_emissions - 1] = self.backpointers[[0, n_emissions - 1]];
        for t in (0..n_emissions - 1).rev() {
            path[t] = self.backpointers[[path[t + 1], t]];
        }
        path
    }
}

impl Model {
    ///
    /// Most likely hidden state path for the observations.
    ///
    pub fn viterbi(&self, observations: &[Symbol]) -> Result<StatePath> {
        Ok(self.viterbi_table(observations)?.path())
    }
    ///
    /// Fill delta and backpointer tables.
    ///
    /// Fails with `NoValidPath` if every final best-path probability is zero.
    ///
    pub fn viterbi_table(&self, observations: &[Symbol]) -> Result<ViterbiTable> {
        self.check_observations(observations)?;
        let n = self.n_states();
        let n_emissions = observations.len();
        let mut delta = Array2::zeros((n, n_emissions));
        let mut backpointers = Array2::zeros((n, n_emissions));

        for (t, &symbol) in observations.iter().enumerate() {
            if t == 0 {
                for i in 0..n {
                    delta[[i, 0]] = self.p_emit(i, symbol) * self.p_init(i);
                }
            } else {
                for i in 0..n {
                    let (p, j) = self
                        .v_step(i, symbol, delta.column(t - 1))
                        .ok_or(HmmError::NoValidPath)?;
                    delta[[i, t]] = p;
                    backpointers[[i, t - 1]] = j;
                }
            }
        }

        let terminal = self.v_terminal(delta.column(n_emissions - 1)).ok_or_else(|| {
            debug!("viterbi: all final delta are zero");
            HmmError::NoValidPath
        })?;
        backpointers.column_mut(n_emissions - 1).fill(terminal);

        Ok(ViterbiTable {
            delta,
            backpointers,
            terminal,
        })
    }
    ///
    /// `(max, argmax)` over predecessors j of `A[j][i] delta[j][t-1] B[i][x[t]]`.
    ///
    /// `>=` keeps the most recently seen candidate on ties.
    ///
    fn v_step(&self, i: State, symbol: Symbol, prev: ArrayView1<f64>) -> Option<(f64, State)> {
        let mut best: Option<(f64, State)> = None;
        let mut max = 0.0;
        for j in 0..self.n_states() {
            let p = self.p_trans(j, i) * prev[j] * self.p_emit(i, symbol);
            if p >= max {
                max = p;
                best = Some((p, j));
            }
        }
        best
    }
    ///
    /// argmax of the final column. `>` keeps the earliest maximum, and zero
    /// probabilities never qualify.
    ///
    fn v_terminal(&self, last: ArrayView1<f64>) -> Option<State> {
        let mut best = None;
        let mut max = 0.0;
        for (i, &p) in last.iter().enumerate() {
            if p > max {
                max = p;
                best = Some(i);
            }
        }
        best
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::*;
    use test_case::test_case;

    #[test]
    fn viterbi_two_state_by_hand() {
        let m = mock_two_state();
        let v = m.viterbi_table(&[0, 1, 0]).unwrap();
        assert_abs_diff_eq!(v.delta()[[0, 1]], 0.0756, epsilon = 1e-15);
        assert_abs_diff_eq!(v.delta()[[1, 1]], 0.1344, epsilon = 1e-15);
        assert_abs_diff_eq!(v.best_prob(), 0.031752, epsilon = 1e-15);
        assert_eq!(v.terminal(), 0);
        assert_eq!(v.path(), vec![0, 0, 0]);
    }
    #[test]
    fn viterbi_backpointers_are_one_step_behind() {
        let m = mock_two_state();
        let obs = vec![0, 1, 0];
        let v = m.viterbi_table(&obs).unwrap();
        let bp = v.backpointers();
        // predecessor of (state 1, t=2) is state 1, stored at t=1
        assert_eq!(bp[[1, 1]], 1);
        // predecessor of (state 0, t=2) is state 0, stored at t=1
        assert_eq!(bp[[0, 1]], 0);
        // predecessors of t=1 stored at t=0
        assert_eq!(bp[[0, 0]], 0);
        assert_eq!(bp[[1, 0]], 0);
        // last column holds the terminal state
        assert_eq!(bp[[0, 2]], v.terminal());
        assert_eq!(bp[[1, 2]], v.terminal());

        // every stored predecessor reproduces delta at the next step
        for t in 1..obs.len() {
            for i in 0..m.n_states() {
                let j = bp[[i, t - 1]];
                assert_abs_diff_eq!(
                    v.delta()[[i, t]],
                    m.p_trans(j, i) * v.delta()[[j, t - 1]] * m.p_emit(i, obs[t]),
                    epsilon = 1e-15
                );
            }
        }
    }
    #[test]
    fn viterbi_tie_breaks() {
        let m = mock_symmetric();
        let v = m.viterbi_table(&[0, 1, 0]).unwrap();
        // propagation: later predecessor wins
        assert!(v.backpointers().slice(ndarray::s![.., 0..2]).iter().all(|&j| j == 1));
        // termination: first state wins
        assert_eq!(v.terminal(), 0);
        assert_eq!(v.path(), vec![1, 1, 0]);

        // single emission only uses the terminal rule
        assert_eq!(m.viterbi(&[1]).unwrap(), vec![0]);
    }
    #[test]
    fn viterbi_no_valid_path() {
        let m = mock_degenerate();
        assert!(matches!(m.viterbi(&[0]), Err(HmmError::NoValidPath)));
        assert!(matches!(m.viterbi(&[2, 2, 1]), Err(HmmError::NoValidPath)));
        assert_eq!(m.viterbi(&[2, 2]).unwrap().len(), 2);
    }
    #[test]
    fn viterbi_rejects_bad_observations() {
        let m = mock_three_state();
        assert!(m.viterbi(&[0, 3]).unwrap_err().is_dimension_mismatch());
        assert!(matches!(m.viterbi(&[]), Err(HmmError::EmptySequence)));
    }

    #[test_case(mock_two_state(), vec![0, 1, 0] ; "two state short")]
    #[test_case(mock_two_state(), vec![1, 1, 0, 1, 0] ; "two state long")]
    #[test_case(mock_three_state(), vec![2, 0, 1, 1] ; "three state")]
    #[test_case(mock_three_state(), vec![0, 0, 2, 2, 1] ; "three state long")]
    #[test_case(mock_irregular(), vec![3, 1, 0, 2, 2] ; "irregular")]
    #[test_case(mock_irregular(), vec![1] ; "irregular single")]
    fn viterbi_matches_enumeration(m: Model, obs: Vec<usize>) {
        let v = m.viterbi_table(&obs).unwrap();
        let path = v.path();
        let best = all_paths(m.n_states(), obs.len())
            .iter()
            .map(|path| joint_prob(&m, path, &obs))
            .fold(0.0, f64::max);
        assert_relative_eq!(v.best_prob(), best, max_relative = 1e-12);
        assert_relative_eq!(joint_prob(&m, &path, &obs), best, max_relative = 1e-12);
    }
}
