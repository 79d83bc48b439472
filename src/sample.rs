//!
//! Sampling observations from the Model
//!
use crate::common::{Observations, State, StatePath, Symbol};
use crate::error::{HmmError, Result};
use crate::model::Model;
use itertools::Itertools;
use ndarray::ArrayView1;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// Struct for storing sampling results from HMM
///
/// `(hidden state, emitted symbol)` for each step.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History(Vec<(State, Symbol)>);

impl History {
    ///
    /// Constructor of empty sample store.
    ///
    pub fn new() -> Self {
        History(Vec::new())
    }
    ///
    /// Append a new state and its emission
    ///
    pub fn push(&mut self, state: State, symbol: Symbol) {
        self.0.push((state, symbol));
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    ///
    /// Observed symbols of the history
    ///
    pub fn to_observations(&self) -> Observations {
        self.0.iter().map(|&(_, symbol)| symbol).collect()
    }
    ///
    /// Hidden states that emitted the symbols
    ///
    pub fn to_states(&self) -> StatePath {
        self.0.iter().map(|&(state, _)| state).collect()
    }
}

impl std::fmt::Display for History {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|(state, symbol)| format!("{}:{}", state, symbol))
                .join(" ")
        )
    }
}

///
/// pick an index randomly with its own probability.
///
fn pick<R: Rng>(rng: &mut R, probs: ArrayView1<f64>) -> Option<usize> {
    WeightedIndex::<f64>::new(probs.iter()).ok().map(|d| d.sample(rng))
}

impl Model {
    ///
    /// Sample `length` steps of hidden states and emissions with the seed.
    ///
    /// Fails with `DegenerateDistribution` when a row to sample from has no
    /// positive weight.
    ///
    pub fn sample(&self, length: usize, seed: u64) -> Result<History> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let pi = self.pi().to_matrix();
        let mut history = History::new();
        let mut state: Option<State> = None;

        for t in 0..length {
            let probs = match state {
                None => pi.row(0),
                Some(prev) => self.a().row(prev),
            };
            let next = pick(&mut rng, probs).ok_or(HmmError::DegenerateDistribution {
                stage: "sampling of state",
                at: t,
            })?;
            let symbol = pick(&mut rng, self.b().row(next)).ok_or(
                HmmError::DegenerateDistribution {
                    stage: "sampling of symbol",
                    at: t,
                },
            )?;
            history.push(next, symbol);
            state = Some(next);
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::*;

    #[test]
    fn sample_is_reproducible() {
        let m = mock_three_state();
        let h1 = m.sample(50, 11).unwrap();
        let h2 = m.sample(50, 11).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 50);
        assert!(m.check_observations(&h1.to_observations()).is_ok());
        assert!(h1.to_states().iter().all(|&s| s < m.n_states()));
        println!("{}", h1);
    }
    #[test]
    fn sample_frequency_follows_emission() {
        // every state of the degenerate model only emits symbol 2
        let m = mock_degenerate();
        let h = m.sample(100, 0).unwrap();
        assert!(h.to_observations().iter().all(|&k| k == 2));
    }
    #[test]
    fn sample_path_has_positive_probability() {
        let m = mock_irregular();
        let h = m.sample(8, 3).unwrap();
        let p = joint_prob(&m, &h.to_states(), &h.to_observations());
        assert!(p > 0.0);
    }
}
