//!
//! Error types of HMM calculation
//!
use thiserror::Error;

///
/// Errors raised by the HMM passes and the boundary I/O.
///
/// Every pass validates its inputs eagerly and aborts the whole operation
/// on the first error. Hitting the iteration cap in training is not an
/// error (see `train::StopReason::MaxIterations`).
///
#[derive(Debug, Error)]
pub enum HmmError {
    /// A matrix or vector does not have the shape required by the model.
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// An observation symbol is outside of `[0, M)`.
    #[error("observation symbol {symbol} at t={t} is out of range (n_symbols={n_symbols})")]
    SymbolOutOfRange {
        t: usize,
        symbol: usize,
        n_symbols: usize,
    },

    /// The observation sequence has no element.
    #[error("observation sequence is empty")]
    EmptySequence,

    /// A required denominator became exactly zero, i.e. the model assigns
    /// zero probability to the observed data.
    ///
    /// `at` is the time step for the passes and the state for re-estimation.
    #[error("degenerate distribution in {stage} at {at}")]
    DegenerateDistribution { stage: &'static str, at: usize },

    /// Every state path has zero probability under the model.
    #[error("no valid state path: all final best-path probabilities are zero")]
    NoValidPath,

    /// A row does not sum to one within the tolerance.
    #[error("{what} row {row} sums to {sum}, not a probability distribution")]
    NotStochastic {
        what: &'static str,
        row: usize,
        sum: f64,
    },

    /// Malformed line of the text format.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HmmError>;

impl HmmError {
    ///
    /// `true` if the error is one of the dimension-mismatch kind,
    /// i.e. the inputs disagree on N or M.
    ///
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            HmmError::DimensionMismatch { .. } | HmmError::SymbolOutOfRange { .. }
        )
    }
    ///
    /// `true` if a denominator vanished somewhere in the calculation.
    ///
    pub fn is_degenerate(&self) -> bool {
        matches!(self, HmmError::DegenerateDistribution { .. })
    }
}
