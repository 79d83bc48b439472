//!
//! Common type definitions
//!

/// index of a hidden state in `[0, N)`
pub type State = usize;

/// index of an observation symbol in `[0, M)`
pub type Symbol = usize;

/// Type of observation sequence
///
/// Owned by the caller and never modified by the passes.
pub type Observations = Vec<Symbol>;

/// Type of decoded hidden state sequence
pub type StatePath = Vec<State>;
