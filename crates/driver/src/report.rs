//! Exploration reports.

use crate::evaluator::Measurement;
use archdse_explorer::{Completion, Objective};
use archdse_space::Configuration;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A configuration together with what the evaluator measured for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedPoint {
    pub configuration: Configuration,
    pub measurement: Measurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum StopReason {
    /// The explorer declared the search complete.
    Completed { completion: Completion },
    /// The evaluation budget ran out first.
    BudgetExhausted,
}

/// Outcome of one exploration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub objective: Objective,
    pub evaluator: String,
    pub baseline: EvaluatedPoint,
    pub best_exec: EvaluatedPoint,
    pub best_edp: EvaluatedPoint,
    /// Evaluations performed, baseline included.
    pub evaluations: usize,
    pub traversals: usize,
    pub stop: StopReason,
    /// Every evaluated point in evaluation order.
    pub history: Vec<EvaluatedPoint>,
    pub generated_at_unix_ms: u128,
}

impl ExplorationReport {
    /// Best point for the objective the session optimized.
    pub fn best(&self) -> &EvaluatedPoint {
        match self.objective {
            Objective::ExecutionTime => &self.best_exec,
            Objective::EnergyDelay => &self.best_edp,
        }
    }

    /// Save report to JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(())
    }

    /// Load report from JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        let report = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse report {}", path.display()))?;
        Ok(report)
    }
}
