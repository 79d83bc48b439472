//!
//! Baum-Welch training
//!
//! Each iteration runs
//!
//! 1. scaled forward
//! 2. scaled backward
//! 3. gamma / di-gamma
//! 4. re-estimation of `(A, B, pi)`
//!
//! on the current model, then computes `log P(x) = -\sum_t log c[t]` from the
//! scaling factors of step 1. Training stops when this log-likelihood does not
//! improve on the previous iteration, or when the iteration cap is reached.
//! The stopping rule compares natural logarithms; `TrainConfig::log_base`
//! only changes the reported values.
//!
//! The model re-estimated by the last iteration is kept even when that
//! iteration triggered the stop. There is no rollback.
//!
use crate::common::Symbol;
use crate::error::Result;
use crate::forward::LogBase;
use crate::model::Model;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Iteration cap of the legacy training loop
pub const DEFAULT_MAX_ITER: usize = 100;

///
/// Configuration of Baum-Welch training
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Maximum number of iterations. At least one iteration is always run.
    pub max_iter: usize,
    /// Base of the reported log-likelihood
    pub log_base: LogBase,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            max_iter: DEFAULT_MAX_ITER,
            log_base: LogBase::Natural,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// log-likelihood did not increase (converged)
    NoImprovement,
    /// `max_iter` iterations were run while still improving
    MaxIterations,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainState {
    Running,
    Stopped(StopReason),
}

///
/// Log of a single iteration
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationLog {
    /// 1-based iteration count
    pub iteration: usize,
    /// log-likelihood of the model given to this iteration
    pub log_prob: f64,
}

impl std::fmt::Display for IterationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\t{}", self.iteration, self.log_prob)
    }
}

///
/// Summary of a finished training run
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub n_iterations: usize,
    pub stop_reason: StopReason,
    /// log-likelihood computed by the last iteration
    pub log_prob: f64,
    pub log_base: LogBase,
    pub logs: Vec<IterationLog>,
}

impl TrainSummary {
    ///
    /// `true` if stopped by the improvement check rather than the cap.
    ///
    pub fn is_converged(&self) -> bool {
        self.stop_reason == StopReason::NoImprovement
    }
}

///
/// Baum-Welch trainer
///
/// The trainer owns the model being trained. Callers only get copies of it
/// (`model`) or take it back when done (`into_model`).
///
#[derive(Clone, Debug)]
pub struct Trainer {
    model: Model,
    config: TrainConfig,
    state: TrainState,
    prev_ln_prob: f64,
    logs: Vec<IterationLog>,
}

impl Trainer {
    pub fn new(model: Model, config: TrainConfig) -> Self {
        Trainer {
            model,
            config,
            state: TrainState::Running,
            prev_ln_prob: f64::NEG_INFINITY,
            logs: Vec::new(),
        }
    }
    pub fn state(&self) -> TrainState {
        self.state
    }
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }
    pub fn n_iterations(&self) -> usize {
        self.logs.len()
    }
    pub fn logs(&self) -> &[IterationLog] {
        &self.logs
    }
    ///
    /// Copy of the current model
    ///
    pub fn model(&self) -> Model {
        self.model.clone()
    }
    pub fn into_model(self) -> Model {
        self.model
    }
    ///
    /// Run a single iteration if still running.
    ///
    /// On error the model keeps the parameters of the last successful
    /// iteration and the state stays `Running`.
    ///
    pub fn step(&mut self, observations: &[Symbol]) -> Result<TrainState> {
        if let TrainState::Stopped(_) = self.state {
            return Ok(self.state);
        }

        let forward = self.model.forward_scaled(observations)?;
        let backward = self.model.backward_scaled(observations, &forward)?;
        let occupancy = self.model.occupancy(observations, &forward, &backward)?;
        self.model = self.model.reestimate(observations, &occupancy)?;

        // the stopping rule always compares natural logs
        let ln_prob = forward.scaling().ln_prob();
        let log_prob = self.config.log_base.convert_ln(ln_prob);
        let iteration = self.logs.len() + 1;
        self.logs.push(IterationLog {
            iteration,
            log_prob,
        });
        info!("iteration={} log_prob={}", iteration, log_prob);

        if ln_prob <= self.prev_ln_prob {
            debug!(
                "ln_prob did not improve ({} <= {})",
                ln_prob, self.prev_ln_prob
            );
            self.state = TrainState::Stopped(StopReason::NoImprovement);
        } else {
            self.prev_ln_prob = ln_prob;
            if iteration >= self.config.max_iter {
                warn!("reached max_iter={} while still improving", iteration);
                self.state = TrainState::Stopped(StopReason::MaxIterations);
            }
        }
        Ok(self.state)
    }
    ///
    /// Iterate until stopped.
    ///
    pub fn run(&mut self, observations: &[Symbol]) -> Result<TrainSummary> {
        self.model.check_observations(observations)?;
        loop {
            if let TrainState::Stopped(stop_reason) = self.step(observations)? {
                return Ok(self.summary(stop_reason));
            }
        }
    }
    fn summary(&self, stop_reason: StopReason) -> TrainSummary {
        TrainSummary {
            n_iterations: self.n_iterations(),
            stop_reason,
            log_prob: self.logs.last().map_or(f64::NEG_INFINITY, |l| l.log_prob),
            log_base: self.config.log_base,
            logs: self.logs.clone(),
        }
    }
}

impl Model {
    ///
    /// Train a copy of the model on the observations with Baum-Welch.
    ///
    pub fn train(
        &self,
        observations: &[Symbol],
        config: TrainConfig,
    ) -> Result<(Model, TrainSummary)> {
        let mut trainer = Trainer::new(self.clone(), config);
        let summary = trainer.run(observations)?;
        Ok((trainer.into_model(), summary))
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmmError;
    use crate::matrix::STOCHASTIC_TOLERANCE;
    use crate::mocks::*;

    fn reestimate_once(m: &Model, obs: &[usize]) -> Model {
        let f = m.forward_scaled(obs).unwrap();
        let b = m.backward_scaled(obs, &f).unwrap();
        let o = m.occupancy(obs, &f, &b).unwrap();
        m.reestimate(obs, &o).unwrap()
    }

    #[test]
    fn train_log_prob_is_increasing_until_stop() {
        let truth = mock_three_state();
        let obs = truth.sample(300, 5).unwrap().to_observations();
        let init = Model::random(3, 3, 1).unwrap();
        let (model, summary) = init.train(&obs, TrainConfig::default()).unwrap();

        assert!(summary.n_iterations >= 1);
        assert!(summary.n_iterations <= DEFAULT_MAX_ITER);
        assert_eq!(summary.logs.len(), summary.n_iterations);
        let n = summary.logs.len();
        for w in summary.logs[..n - 1].windows(2) {
            assert!(w[0].log_prob < w[1].log_prob);
        }
        if summary.is_converged() {
            assert!(summary.logs[n - 1].log_prob <= summary.logs[n - 2].log_prob);
        }
        assert!(model.check_stochastic(STOCHASTIC_TOLERANCE).is_ok());
    }
    #[test]
    fn train_improves_likelihood() {
        let truth = mock_irregular();
        let obs = truth.sample(500, 2).unwrap().to_observations();
        let init = Model::random(3, 4, 42).unwrap();
        let before = init.log_likelihood(&obs, LogBase::Natural).unwrap();
        let (model, _) = init.train(&obs, TrainConfig::default()).unwrap();
        let after = model.log_likelihood(&obs, LogBase::Natural).unwrap();
        assert!(after > before);
    }
    #[test]
    fn train_returns_last_reestimated_model() {
        let obs = mock_two_state().sample(60, 8).unwrap().to_observations();
        let init = Model::random(2, 2, 3).unwrap();
        let (model, summary) = init.train(&obs, TrainConfig::default()).unwrap();

        // replay the same number of re-estimations by hand
        let mut expected = init.clone();
        for _ in 0..summary.n_iterations {
            expected = reestimate_once(&expected, &obs);
        }
        assert_eq!(model, expected);
    }
    #[test]
    fn train_stops_at_cap() {
        let obs = mock_three_state().sample(200, 0).unwrap().to_observations();
        let init = Model::random(3, 3, 9).unwrap();
        let config = TrainConfig {
            max_iter: 3,
            log_base: LogBase::Natural,
        };
        let mut trainer = Trainer::new(init.clone(), config);
        let summary = trainer.run(&obs).unwrap();
        assert_eq!(summary.n_iterations, 3);
        assert_eq!(summary.stop_reason, StopReason::MaxIterations);
        assert!(!summary.is_converged());
        assert_eq!(trainer.state(), TrainState::Stopped(StopReason::MaxIterations));

        // a stopped trainer does nothing more
        let model = trainer.model();
        assert_eq!(trainer.step(&obs).unwrap(), trainer.state());
        assert_eq!(trainer.model(), model);
        assert_eq!(trainer.n_iterations(), 3);
    }
    #[test]
    fn train_runs_at_least_once() {
        let obs = vec![0, 1, 1, 0, 1, 0, 0];
        let config = TrainConfig {
            max_iter: 0,
            log_base: LogBase::Natural,
        };
        let (model, summary) = mock_two_state().train(&obs, config).unwrap();
        assert_eq!(summary.n_iterations, 1);
        assert_eq!(model, reestimate_once(&mock_two_state(), &obs));
    }
    #[test]
    fn train_stops_on_no_improvement() {
        // uniform model is a fixed point when both symbols are equally frequent
        let obs = vec![0, 1, 0, 1, 1, 0];
        let (_, summary) = Model::uniform(2, 2)
            .unwrap()
            .train(&obs, TrainConfig::default())
            .unwrap();
        assert!(summary.is_converged());
        assert!(summary.n_iterations < DEFAULT_MAX_ITER);
    }
    #[test]
    fn train_log_base_does_not_change_model() {
        let obs = mock_two_state().sample(40, 1).unwrap().to_observations();
        let init = Model::random(2, 2, 0).unwrap();
        let (m1, s1) = init.train(&obs, TrainConfig::default()).unwrap();
        let (m2, s2) = init
            .train(
                &obs,
                TrainConfig {
                    max_iter: DEFAULT_MAX_ITER,
                    log_base: LogBase::Two,
                },
            )
            .unwrap();
        assert_eq!(m1, m2);
        assert_eq!(s1.n_iterations, s2.n_iterations);
        assert_relative_eq!(s1.log_prob / 2f64.ln(), s2.log_prob, max_relative = 1e-12);
    }
    #[test]
    fn train_degenerate() {
        let e = mock_degenerate().train(&[0, 1], TrainConfig::default()).unwrap_err();
        assert!(e.is_degenerate());
        let e = mock_two_state().train(&[], TrainConfig::default()).unwrap_err();
        assert!(matches!(e, HmmError::EmptySequence));
    }
}
