//!
//! Mock models for testing
//!
use crate::common::{State, StatePath, Symbol};
use crate::matrix::{StochasticMatrix, StochasticVector};
use crate::model::Model;
use itertools::Itertools;

fn model_from_rows(a: Vec<Vec<f64>>, b: Vec<Vec<f64>>, pi: Vec<f64>) -> Model {
    Model::new(
        StochasticMatrix::from_rows(a).unwrap(),
        StochasticMatrix::from_rows(b).unwrap(),
        StochasticVector::new(pi),
    )
    .unwrap()
}

///
/// 2 states, 2 symbols
///
/// ```text
/// A = 0.6 0.4    B = 0.7 0.3    pi = 0.6 0.4
///     0.3 0.7        0.2 0.8
/// ```
///
pub fn mock_two_state() -> Model {
    model_from_rows(
        vec![vec![0.6, 0.4], vec![0.3, 0.7]],
        vec![vec![0.7, 0.3], vec![0.2, 0.8]],
        vec![0.6, 0.4],
    )
}

///
/// 3 states, 3 symbols, each state prefers emitting its own index.
///
pub fn mock_three_state() -> Model {
    model_from_rows(
        vec![
            vec![0.8, 0.1, 0.1],
            vec![0.1, 0.7, 0.2],
            vec![0.2, 0.2, 0.6],
        ],
        vec![
            vec![0.7, 0.2, 0.1],
            vec![0.1, 0.8, 0.1],
            vec![0.2, 0.1, 0.7],
        ],
        vec![0.5, 0.3, 0.2],
    )
}

///
/// 3 states, 4 symbols with irregular (non-symmetric) parameters.
///
pub fn mock_irregular() -> Model {
    model_from_rows(
        vec![
            vec![0.5, 0.3, 0.2],
            vec![0.25, 0.25, 0.5],
            vec![0.1, 0.6, 0.3],
        ],
        vec![
            vec![0.4, 0.3, 0.2, 0.1],
            vec![0.1, 0.1, 0.3, 0.5],
            vec![0.25, 0.45, 0.05, 0.25],
        ],
        vec![0.2, 0.5, 0.3],
    )
}

///
/// 2 states, 3 symbols where both states can only emit symbol 2.
///
/// Any observation other than 2 has zero probability under this model.
///
pub fn mock_degenerate() -> Model {
    model_from_rows(
        vec![vec![0.5, 0.5], vec![0.5, 0.5]],
        vec![vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0]],
        vec![0.5, 0.5],
    )
}

///
/// 2 states with identical rows, so every path of the same state count
/// ties. Used to pin the tie-breaking rules of Viterbi.
///
pub fn mock_symmetric() -> Model {
    model_from_rows(
        vec![vec![0.5, 0.5], vec![0.5, 0.5]],
        vec![vec![0.5, 0.5], vec![0.5, 0.5]],
        vec![0.5, 0.5],
    )
}

//
// Brute-force oracles
//

///
/// Joint probability `P(states, observations)` of a single state path.
///
pub fn joint_prob(model: &Model, states: &[State], observations: &[Symbol]) -> f64 {
    assert_eq!(states.len(), observations.len());
    states
        .iter()
        .zip(observations.iter())
        .enumerate()
        .map(|(t, (&s, &o))| {
            let p_trans = if t == 0 {
                model.p_init(s)
            } else {
                model.p_trans(states[t - 1], s)
            };
            p_trans * model.p_emit(s, o)
        })
        .product()
}

///
/// All `N^T` state paths of length `t`, in lexicographic order.
///
pub fn all_paths(n_states: usize, length: usize) -> Vec<StatePath> {
    (0..length)
        .map(|_| 0..n_states)
        .multi_cartesian_product()
        .collect()
}

///
/// `P(observations)` by summing the joint probability over all state paths.
///
pub fn full_prob_by_enumeration(model: &Model, observations: &[Symbol]) -> f64 {
    all_paths(model.n_states(), observations.len())
        .iter()
        .map(|path| joint_prob(model, path, observations))
        .sum()
}
