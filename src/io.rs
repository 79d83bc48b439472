//!
//! Line-oriented text format of matrices and sequences
//!
//! ```text
//! matrix:   rows cols v_1 v_2 ... v_{rows*cols}     (row-major)
//! sequence: T x_1 x_2 ... x_T
//! ```
//!
//! The initial distribution pi is written as a `1 x N` matrix.
//!
//! Matrix values are written in plain decimal notation. Whole numbers keep
//! a trailing `.0` (`1.0`, `0.0`), but small values never switch to the
//! exponent form (`0.00001`, not `1.0E-5`). Both notations are accepted
//! when parsing.
//!
use crate::common::{Observations, State};
use crate::error::{HmmError, Result};
use crate::matrix::{matrix_size, StochasticMatrix, StochasticVector};
use crate::model::Model;
use itertools::Itertools;
use std::io::BufRead;
use std::str::FromStr;

fn parse_token<T: FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| HmmError::Parse(format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| HmmError::Parse(format!("invalid {} `{}`", what, token)))
}

fn check_no_trailing<'a, I: Iterator<Item = &'a str>>(mut tokens: I) -> Result<()> {
    match tokens.next() {
        Some(token) => Err(HmmError::Parse(format!("unexpected token `{}`", token))),
        None => Ok(()),
    }
}

///
/// Parse `rows cols v_1 ... v_{rows*cols}` into a matrix.
///
pub fn parse_matrix(line: &str) -> Result<StochasticMatrix> {
    let mut tokens = line.split_whitespace();
    let rows: usize = parse_token(tokens.next(), "number of rows")?;
    let cols: usize = parse_token(tokens.next(), "number of columns")?;
    let values = (0..matrix_size(rows, cols)?)
        .map(|_| parse_token::<f64>(tokens.next(), "matrix value"))
        .collect::<Result<Vec<f64>>>()?;
    check_no_trailing(tokens)?;
    StochasticMatrix::new(rows, cols, values)
}

///
/// Shortest decimal that parses back to the same `f64`, with `.0` on whole
/// numbers.
///
fn format_value(x: f64) -> String {
    let s = x.to_string();
    if x.is_finite() && !s.contains('.') {
        format!("{}.0", s)
    } else {
        s
    }
}

///
/// Format a matrix as `rows cols v_1 ... v_{rows*cols}`.
///
/// `parse_matrix(&format_matrix(m)) == m` holds exactly.
///
pub fn format_matrix(matrix: &StochasticMatrix) -> String {
    std::iter::once(matrix.n_rows().to_string())
        .chain(std::iter::once(matrix.n_cols().to_string()))
        .chain(matrix.values().map(format_value))
        .join(" ")
}

///
/// Parse `T x_1 ... x_T` into an integer sequence.
///
pub fn parse_sequence(line: &str) -> Result<Observations> {
    let mut tokens = line.split_whitespace();
    let length: usize = parse_token(tokens.next(), "sequence length")?;
    let sequence = (0..length)
        .map(|_| parse_token::<usize>(tokens.next(), "sequence element"))
        .collect::<Result<Vec<usize>>>()?;
    check_no_trailing(tokens)?;
    Ok(sequence)
}

///
/// Format a sequence as `T x_1 ... x_T`.
///
pub fn format_sequence(sequence: &[usize]) -> String {
    std::iter::once(sequence.len())
        .chain(sequence.iter().copied())
        .join(" ")
}

///
/// Format a decoded state path as `s_1 s_2 ... s_T ` (no count, every value
/// followed by a space).
///
pub fn format_states(states: &[State]) -> String {
    states.iter().map(|s| format!("{} ", s)).collect()
}

///
/// Parse the three lines of A, B and pi into a Model.
///
pub fn parse_model(a: &str, b: &str, pi: &str) -> Result<Model> {
    let a = parse_matrix(a)?;
    let b = parse_matrix(b)?;
    let pi = StochasticVector::from_matrix(&parse_matrix(pi)?)?;
    Model::new(a, b, pi)
}

///
/// Model and (optional) observation sequence read from the input
///
#[derive(Clone, Debug)]
pub struct Input {
    pub model: Model,
    pub observations: Option<Observations>,
}

impl Input {
    ///
    /// Observations, or an error if the input had no sequence line.
    ///
    pub fn observations(&self) -> Result<&[usize]> {
        self.observations
            .as_deref()
            .ok_or_else(|| HmmError::Parse("missing observation sequence".to_string()))
    }
}

///
/// Read the lines `A`, `B`, `pi` (and the observation sequence if
/// `with_sequence`). Blank lines are skipped.
///
pub fn read_input<R: BufRead>(reader: R, with_sequence: bool) -> Result<Input> {
    let lines: Vec<String> = reader
        .lines()
        .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .collect::<std::io::Result<Vec<String>>>()?;
    let n_required = if with_sequence { 4 } else { 3 };
    if lines.len() < n_required {
        return Err(HmmError::Parse(format!(
            "expected {} lines but found {}",
            n_required,
            lines.len()
        )));
    }
    let model = parse_model(&lines[0], &lines[1], &lines[2])?;
    let observations = if with_sequence {
        Some(parse_sequence(&lines[3])?)
    } else {
        None
    };
    Ok(Input {
        model,
        observations,
    })
}

//
// Tests
//
