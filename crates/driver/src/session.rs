//! Budgeted exploration session.

use crate::evaluator::{Evaluator, Measurement};
use crate::report::{EvaluatedPoint, ExplorationReport, StopReason};
use anyhow::{ensure, Context, Result};
use archdse_explorer::{
    BestKnown, CacheValidator, Explorer, ExplorerConfig, LatencyDeriver, Objective, Proposal,
};
use archdse_space::{Configuration, DesignSpace, VisitedSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Mid-range starting point of the default space: 2-wide core, 4 KiB 2-way
/// L1s with 32B blocks, 256 KiB 2-way ul2 with 64B blocks.
pub const DEFAULT_BASELINE: &str = "1 0 2 1 1 1 1 3 2 1 0 0 1 1 1 2 2 4";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Maximum number of evaluations, baseline included.
    pub budget: usize,
    pub objective: Objective,
    pub explorer: ExplorerConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            budget: 1000,
            objective: Objective::ExecutionTime,
            explorer: ExplorerConfig::default(),
        }
    }
}

/// Drives the explorer: propose, evaluate, record, repeat.
pub struct ExplorationSession<E: Evaluator> {
    explorer: Explorer,
    evaluator: E,
    options: SessionOptions,
    visited: VisitedSet,
    history: Vec<EvaluatedPoint>,
}

impl<E: Evaluator> ExplorationSession<E> {
    /// Session over `space` with the cache-hierarchy rules and latency derivation.
    pub fn new(space: DesignSpace, evaluator: E, options: SessionOptions) -> Result<Self> {
        let explorer = Explorer::new(
            space,
            Arc::new(CacheValidator::default()),
            Arc::new(LatencyDeriver::default()),
            options.explorer.clone(),
        )?;
        Ok(Self::with_explorer(explorer, evaluator, options))
    }

    pub fn with_explorer(explorer: Explorer, evaluator: E, options: SessionOptions) -> Self {
        Self {
            explorer,
            evaluator,
            options,
            visited: VisitedSet::new(),
            history: Vec::new(),
        }
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    fn evaluate(&mut self, config: &Configuration) -> Result<Measurement> {
        let measurement = self
            .evaluator
            .evaluate(config)
            .with_context(|| format!("evaluating {}", config))?;
        self.visited.insert(config.clone());
        self.history.push(EvaluatedPoint {
            configuration: config.clone(),
            measurement,
        });
        Ok(measurement)
    }

    /// Explore from `baseline` until the explorer finishes or the budget runs out.
    pub fn run(&mut self, baseline: Configuration) -> Result<ExplorationReport> {
        ensure!(self.options.budget > 0, "evaluation budget must be at least 1");
        let baseline = self.explorer.complete(&baseline);
        ensure!(
            self.explorer.validator().is_valid(self.explorer.space(), &baseline),
            "baseline {} is not a valid configuration",
            baseline
        );

        let objective = self.options.objective;
        let baseline_measurement = self.evaluate(&baseline)?;
        let baseline_point = EvaluatedPoint {
            configuration: baseline.clone(),
            measurement: baseline_measurement,
        };
        let mut best = BestKnown::uniform(baseline.clone());
        let mut best_exec = baseline_point.clone();
        let mut best_edp = baseline_point.clone();
        let mut current = baseline;

        let stop = loop {
            if self.history.len() >= self.options.budget {
                warn!(
                    budget = self.options.budget,
                    traversals = self.explorer.traversals(),
                    "evaluation budget exhausted before convergence"
                );
                break StopReason::BudgetExhausted;
            }

            let next = match self
                .explorer
                .propose_next(&current, &best, objective, &self.visited)
            {
                Proposal::Candidate(next) => next,
                Proposal::Complete { reason, .. } => {
                    info!(?reason, evaluations = self.history.len(), "exploration complete");
                    break StopReason::Completed { completion: reason };
                }
            };

            let measurement = self.evaluate(&next)?;
            if measurement.execution_time < best_exec.measurement.execution_time {
                info!(
                    config = %next,
                    execution_time = measurement.execution_time,
                    "new best execution time"
                );
                best.exec = next.clone();
                best_exec = EvaluatedPoint {
                    configuration: next.clone(),
                    measurement,
                };
            }
            if measurement.edp() < best_edp.measurement.edp() {
                info!(config = %next, edp = measurement.edp(), "new best energy-delay product");
                best.edp = next.clone();
                best_edp = EvaluatedPoint {
                    configuration: next.clone(),
                    measurement,
                };
            }
            current = next;
        };

        Ok(ExplorationReport {
            objective,
            evaluator: self.evaluator.name().to_string(),
            baseline: baseline_point,
            best_exec,
            best_edp,
            evaluations: self.history.len(),
            traversals: self.explorer.traversals(),
            stop,
            history: self.history.clone(),
            generated_at_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::AnalyticEvaluator;
    use archdse_explorer::Completion;

    #[test]
    fn test_default_baseline_is_valid() {
        let space = DesignSpace::default();
        let baseline: Configuration = DEFAULT_BASELINE.parse().unwrap();
        assert!(CacheValidator::default().violation(&space, &baseline).is_none());
    }

    #[test]
    fn test_run_converges_within_budget() {
        let mut session = ExplorationSession::new(
            DesignSpace::default(),
            AnalyticEvaluator::default(),
            SessionOptions::default(),
        )
        .unwrap();
        let report = session.run(DEFAULT_BASELINE.parse().unwrap()).unwrap();

        assert_eq!(
            report.stop,
            StopReason::Completed {
                completion: Completion::Converged
            }
        );
        assert_eq!(report.evaluations, report.history.len());
        assert_eq!(report.evaluations, session.visited().len());
        assert!(
            report.best().measurement.execution_time
                <= report.baseline.measurement.execution_time
        );
        assert!(report.best_edp.measurement.edp() <= report.baseline.measurement.edp());
    }

    #[test]
    fn test_budget_stops_the_loop() {
        let options = SessionOptions {
            budget: 5,
            ..SessionOptions::default()
        };
        let mut session =
            ExplorationSession::new(DesignSpace::default(), AnalyticEvaluator::default(), options)
                .unwrap();
        let report = session.run(DEFAULT_BASELINE.parse().unwrap()).unwrap();
        assert_eq!(report.stop, StopReason::BudgetExhausted);
        assert_eq!(report.evaluations, 5);
        assert_eq!(session.evaluator().evaluations(), 5);
    }

    #[test]
    fn test_invalid_baseline_is_rejected() {
        let mut session = ExplorationSession::new(
            DesignSpace::default(),
            AnalyticEvaluator::default(),
            SessionOptions::default(),
        )
        .unwrap();
        // 1 KiB L1s are below the minimum.
        let result = session.run("1 0 0 1 1 1 1 3 2 1 0 0 1 1 1 0 0 0".parse().unwrap());
        assert!(result.is_err());
        assert_eq!(session.evaluator().evaluations(), 0);
    }

    #[test]
    fn test_baseline_latencies_are_recomputed() {
        let mut session = ExplorationSession::new(
            DesignSpace::default(),
            AnalyticEvaluator::default(),
            SessionOptions {
                budget: 1,
                ..SessionOptions::default()
            },
        )
        .unwrap();
        let report = session
            .run("1 0 2 1 1 1 1 3 2 1 0 0 1 1 1 0 0 0".parse().unwrap())
            .unwrap();
        assert_eq!(report.baseline.configuration.to_string(), DEFAULT_BASELINE);
    }
}
