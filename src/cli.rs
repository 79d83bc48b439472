//!
//! Commands of the `dhmm` binary
//!
//! Each command takes the parsed `Input` and returns the text to print, so
//! that the binary only has to deal with argument parsing and stdout.
//!
use crate::error::Result;
use crate::forward::LogBase;
use crate::io::{format_matrix, format_sequence, format_states, read_input, Input};
use crate::model::Model;
use crate::train::{TrainConfig, TrainSummary};
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Tolerance of the row-stochastic check of `--strict`
pub const DEFAULT_STRICT_TOLERANCE: f64 = 1e-6;

///
/// Open the input file, or stdin if no path is given.
///
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            debug!("reading {}", path.display());
            Ok(Box::new(BufReader::new(File::open(path)?)))
        }
        None => {
            debug!("reading stdin");
            Ok(Box::new(BufReader::new(std::io::stdin())))
        }
    }
}

///
/// Read the input lines and, if `strict_tolerance` is given, check that
/// every row of the model is a probability distribution.
///
pub fn load<R: BufRead>(
    reader: R,
    with_sequence: bool,
    strict_tolerance: Option<f64>,
) -> Result<Input> {
    let input = read_input(reader, with_sequence)?;
    if let Some(tol) = strict_tolerance {
        input.model.check_stochastic(tol)?;
    }
    info!(
        "loaded model n_states={} n_symbols={} n_emissions={}",
        input.model.n_states(),
        input.model.n_symbols(),
        input.observations.as_ref().map_or(0, |o| o.len())
    );
    Ok(input)
}

///
/// `P(x | model)` by the unscaled forward pass, or the scaled
/// log-likelihood in `log_base` if given.
///
pub fn evaluate(input: &Input, log_base: Option<LogBase>) -> Result<String> {
    let observations = input.observations()?;
    let value = match log_base {
        Some(base) => input.model.log_likelihood(observations, base)?,
        None => input.model.forward(observations)?.full_prob(),
    };
    Ok(value.to_string())
}

///
/// Base of `evaluate` output. Giving a base implies the log-likelihood,
/// and `--log` alone means the natural logarithm.
///
pub fn evaluate_log_base(log: bool, log_base: Option<LogBase>) -> Option<LogBase> {
    match (log, log_base) {
        (_, Some(base)) => Some(base),
        (true, None) => Some(LogBase::default()),
        (false, None) => None,
    }
}

///
/// Most likely state path, each state followed by a space.
///
pub fn decode(input: &Input) -> Result<String> {
    let path = input.model.viterbi(input.observations()?)?;
    Ok(format_states(&path))
}

///
/// JSON output of `learn`
///
#[derive(Serialize)]
struct LearnReport<'a> {
    summary: &'a TrainSummary,
    model: &'a Model,
}

///
/// Train the model with Baum-Welch and print the re-estimated A and B as
/// two matrix lines, or the whole model and summary as JSON.
///
pub fn learn(input: &Input, config: TrainConfig, json: bool) -> Result<String> {
    let (model, summary) = input.model.train(input.observations()?, config)?;
    info!(
        "training finished n_iterations={} stop_reason={:?} log_prob={}",
        summary.n_iterations, summary.stop_reason, summary.log_prob
    );
    if json {
        let report = LearnReport {
            summary: &summary,
            model: &model,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        Ok(format!(
            "{}\n{}",
            format_matrix(model.a()),
            format_matrix(model.b())
        ))
    }
}

///
/// `pi * A * B` as a single matrix line.
///
pub fn propagate(input: &Input) -> Result<String> {
    Ok(format_matrix(&input.model.propagate()?))
}

///
/// Sample `length` emissions from the model as a sequence line. With
/// `with_states` the hidden states follow on a second line.
///
pub fn sample(input: &Input, length: usize, seed: u64, with_states: bool) -> Result<String> {
    let history = input.model.sample(length, seed)?;
    debug!("sampled {}", history);
    let mut out = format_sequence(&history.to_observations());
    if with_states {
        out.push('\n');
        out.push_str(&format_sequence(&history.to_states()));
    }
    Ok(out)
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmmError;
    use crate::io::parse_matrix;
    use crate::mocks::*;
    use std::io::Write;

    const TWO_STATE: &str = "2 2 0.6 0.4 0.3 0.7\n2 2 0.7 0.3 0.2 0.8\n1 2 0.6 0.4\n";

    fn input_with(obs: &str) -> Input {
        load(format!("{}{}\n", TWO_STATE, obs).as_bytes(), true, None).unwrap()
    }

    #[test]
    fn evaluate_matches_enumeration() {
        let input = input_with("3 0 1 0");
        let p: f64 = evaluate(&input, None).unwrap().parse().unwrap();
        let expected = full_prob_by_enumeration(&mock_two_state(), &[0, 1, 0]);
        assert_abs_diff_eq!(p, expected, epsilon = 1e-15);

        let lp: f64 = evaluate(&input, Some(LogBase::Natural))
            .unwrap()
            .parse()
            .unwrap();
        assert_abs_diff_eq!(lp, expected.ln(), epsilon = 1e-12);
    }
    #[test]
    fn evaluate_log_base_implies_log() {
        assert_eq!(evaluate_log_base(false, None), None);
        assert_eq!(evaluate_log_base(true, None), Some(LogBase::Natural));
        assert_eq!(evaluate_log_base(false, Some(LogBase::Two)), Some(LogBase::Two));
        assert_eq!(evaluate_log_base(true, Some(LogBase::Ten)), Some(LogBase::Ten));

        let input = input_with("3 0 1 0");
        let expected = full_prob_by_enumeration(&mock_two_state(), &[0, 1, 0]);
        let lp: f64 = evaluate(&input, evaluate_log_base(false, Some(LogBase::Two)))
            .unwrap()
            .parse()
            .unwrap();
        assert_abs_diff_eq!(lp, expected.log2(), epsilon = 1e-12);
    }
    #[test]
    fn decode_output_format() {
        let input = input_with("3 0 0 0");
        assert_eq!(decode(&input).unwrap(), "0 0 0 ");
    }
    #[test]
    fn learn_outputs_two_matrix_lines() {
        let input = input_with("8 0 1 1 0 0 0 1 0");
        let out = learn(&input, TrainConfig::default(), false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let a = parse_matrix(lines[0]).unwrap();
        let b = parse_matrix(lines[1]).unwrap();
        assert_eq!(a.n_rows(), 2);
        assert_eq!(a.n_cols(), 2);
        assert_eq!(b.n_cols(), 2);
        assert!(a.is_row_stochastic(1e-9));
        assert!(b.is_row_stochastic(1e-9));
    }
    #[test]
    fn learn_json() {
        let input = input_with("8 0 1 1 0 0 0 1 0");
        let out = learn(&input, TrainConfig::default(), true).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(v["summary"]["n_iterations"].as_u64().unwrap() >= 1);
        assert!(v["model"].is_object());
    }
    #[test]
    fn propagate_line() {
        let input = load(TWO_STATE.as_bytes(), false, None).unwrap();
        let m = parse_matrix(&propagate(&input).unwrap()).unwrap();
        // pi A = [0.48, 0.52]; (pi A) B = [0.44, 0.56]
        assert_eq!(m.n_rows(), 1);
        assert_abs_diff_eq!(m[(0, 0)], 0.44, epsilon = 1e-12);
        assert_abs_diff_eq!(m[(0, 1)], 0.56, epsilon = 1e-12);
    }
    #[test]
    fn sample_line_is_a_sequence() {
        let input = load(TWO_STATE.as_bytes(), false, None).unwrap();
        let out = sample(&input, 10, 4, true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let obs = crate::io::parse_sequence(lines[0]).unwrap();
        assert_eq!(obs.len(), 10);
        assert!(input.model.check_observations(&obs).is_ok());
    }
    #[test]
    fn strict_rejects_non_stochastic_rows() {
        let text = "2 2 0.6 0.5 0.3 0.7\n2 2 0.7 0.3 0.2 0.8\n1 2 0.6 0.4\n";
        assert!(load(text.as_bytes(), false, None).is_ok());
        let e = load(text.as_bytes(), false, Some(DEFAULT_STRICT_TOLERANCE)).unwrap_err();
        assert!(matches!(e, HmmError::NotStochastic { what: "A", row: 0, .. }));
    }
    #[test]
    fn read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}4 1 1 0 1", TWO_STATE).unwrap();
        let reader = open_input(Some(file.path())).unwrap();
        let input = load(reader, true, Some(DEFAULT_STRICT_TOLERANCE)).unwrap();
        assert_eq!(input.model, mock_two_state());
        assert_eq!(input.observations().unwrap(), &[1, 1, 0, 1]);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            open_input(Some(&missing)),
            Err(HmmError::Io(_))
        ));
    }
    #[test]
    fn errors_are_reported() {
        // symbol 2 with M = 2
        let input = input_with("2 0 2");
        assert!(evaluate(&input, None).unwrap_err().is_dimension_mismatch());
        assert!(decode(&input).unwrap_err().is_dimension_mismatch());
        let input = load(TWO_STATE.as_bytes(), false, None).unwrap();
        assert!(matches!(decode(&input), Err(HmmError::Parse(_))));
    }
}
