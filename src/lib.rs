//!
//! Discrete hidden Markov model
//!
//! * evaluation: forward pass (plain and scaled)
//! * decoding: Viterbi
//! * learning: Baum-Welch with scaled forward/backward
//!
pub mod backward;
pub mod cli;
pub mod common;
pub mod error;
pub mod forward;
pub mod io;
pub mod matrix;
pub mod mocks;
pub mod model;
pub mod occupancy;
pub mod reestimate;
pub mod sample;
pub mod train;
pub mod viterbi;

pub use error::{HmmError, Result};
pub use model::Model;

#[macro_use]
extern crate approx;
