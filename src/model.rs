//!
//! Definition of discrete HMM
//!
//! ```text
//! A[i][j] = P(state j at t+1 | state i at t)     N x N
//! B[i][k] = P(symbol k at t  | state i at t)     N x M
//! pi[i]   = P(state i at t=0)                    N
//! ```
//!
use crate::common::{State, Symbol};
use crate::error::{HmmError, Result};
use crate::matrix::{StochasticMatrix, StochasticVector};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

///
/// HMM parameters `(A, B, pi)` over N hidden states and M symbols.
///
/// The shapes are checked once in `Model::new`, so every pass can index
/// the matrices without further checks. Deserialization goes through
/// `Model::new` as well.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModel")]
pub struct Model {
    a: StochasticMatrix,
    b: StochasticMatrix,
    pi: StochasticVector,
}

/// Unchecked `(A, B, pi)` as read by serde
#[derive(Deserialize)]
struct RawModel {
    a: StochasticMatrix,
    b: StochasticMatrix,
    pi: StochasticVector,
}

impl TryFrom<RawModel> for Model {
    type Error = HmmError;
    fn try_from(raw: RawModel) -> Result<Model> {
        Model::new(raw.a, raw.b, raw.pi)
    }
}

impl Model {
    ///
    /// Create a model after checking that
    ///
    /// * A is `N x N` (N >= 1)
    /// * B is `N x M` (M >= 1)
    /// * pi has length N
    ///
    pub fn new(a: StochasticMatrix, b: StochasticMatrix, pi: StochasticVector) -> Result<Model> {
        let n = a.n_rows();
        if n == 0 {
            return Err(HmmError::DimensionMismatch {
                what: "number of states",
                expected: 1,
                found: 0,
            });
        }
        if a.n_cols() != n {
            return Err(HmmError::DimensionMismatch {
                what: "columns of A",
                expected: n,
                found: a.n_cols(),
            });
        }
        if b.n_rows() != n {
            return Err(HmmError::DimensionMismatch {
                what: "rows of B",
                expected: n,
                found: b.n_rows(),
            });
        }
        if b.n_cols() == 0 {
            return Err(HmmError::DimensionMismatch {
                what: "number of symbols",
                expected: 1,
                found: 0,
            });
        }
        if pi.len() != n {
            return Err(HmmError::DimensionMismatch {
                what: "length of pi",
                expected: n,
                found: pi.len(),
            });
        }
        Ok(Model { a, b, pi })
    }
    ///
    /// Model with uniform A, B and pi.
    ///
    /// Baum-Welch cannot move away from this point, so it is only useful
    /// for evaluation.
    ///
    pub fn uniform(n_states: usize, n_symbols: usize) -> Result<Model> {
        Model::new(
            StochasticMatrix::uniform(n_states, n_states),
            StochasticMatrix::uniform(n_states, n_symbols),
            StochasticVector::uniform(n_states),
        )
    }
    ///
    /// Model with random near-uniform parameters, a starting point of training.
    ///
    pub fn random(n_states: usize, n_symbols: usize, seed: u64) -> Result<Model> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let a = StochasticMatrix::random(n_states, n_states, &mut rng);
        let b = StochasticMatrix::random(n_states, n_symbols, &mut rng);
        let pi = StochasticVector::random(n_states, &mut rng);
        Model::new(a, b, pi)
    }
    /// Number of hidden states N
    pub fn n_states(&self) -> usize {
        self.a.n_rows()
    }
    /// Number of observation symbols M
    pub fn n_symbols(&self) -> usize {
        self.b.n_cols()
    }
    /// Transition matrix A
    pub fn a(&self) -> &StochasticMatrix {
        &self.a
    }
    /// Emission matrix B
    pub fn b(&self) -> &StochasticMatrix {
        &self.b
    }
    /// Initial state distribution pi
    pub fn pi(&self) -> &StochasticVector {
        &self.pi
    }
    ///
    /// `A[i][j]`, transition probability from state i to state j.
    ///
    #[inline]
    pub fn p_trans(&self, i: State, j: State) -> f64 {
        self.a[(i, j)]
    }
    ///
    /// `B[i][k]`, probability that state i emits symbol k.
    ///
    #[inline]
    pub fn p_emit(&self, i: State, k: Symbol) -> f64 {
        self.b[(i, k)]
    }
    ///
    /// `pi[i]`, probability of starting from state i.
    ///
    #[inline]
    pub fn p_init(&self, i: State) -> f64 {
        self.pi[i]
    }
    ///
    /// Check that the observations can be used with this model.
    ///
    /// * the sequence is not empty
    /// * every symbol is in `[0, M)`
    ///
    pub fn check_observations(&self, observations: &[Symbol]) -> Result<()> {
        if observations.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        let n_symbols = self.n_symbols();
        match observations
            .iter()
            .enumerate()
            .find(|&(_, &symbol)| symbol >= n_symbols)
        {
            Some((t, &symbol)) => Err(HmmError::SymbolOutOfRange {
                t,
                symbol,
                n_symbols,
            }),
            None => Ok(()),
        }
    }
    ///
    /// Check that every row of A, B and pi sums to one within `tol`.
    ///
    pub fn check_stochastic(&self, tol: f64) -> Result<()> {
        self.a.check_stochastic("A", tol)?;
        self.b.check_stochastic("B", tol)?;
        self.pi.check_stochastic("pi", tol)
    }
    ///
    /// Distribution of the symbol emitted after one transition
    /// from the initial distribution, `pi * A * B` (`1 x M`).
    ///
    pub fn propagate(&self) -> Result<StochasticMatrix> {
        self.pi.to_matrix().dot(&self.a)?.dot(&self.b)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "A:")?;
        write!(f, "{}", self.a)?;
        writeln!(f, "B:")?;
        write!(f, "{}", self.b)?;
        writeln!(f, "pi:")?;
        write!(f, "{}", self.pi.to_matrix())
    }
}
