//! Optimization objectives and the best-known reference points.

use archdse_space::Configuration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    /// Minimize execution time.
    ExecutionTime,
    /// Minimize the energy-delay product.
    EnergyDelay,
}

/// Best configuration seen so far for each objective.
///
/// The explorer reads it to fill every dimension it is not currently varying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestKnown {
    pub exec: Configuration,
    pub edp: Configuration,
}

impl BestKnown {
    /// Both objectives start from the same point.
    pub fn uniform(config: Configuration) -> Self {
        Self {
            exec: config.clone(),
            edp: config,
        }
    }

    pub fn for_objective(&self, objective: Objective) -> &Configuration {
        match objective {
            Objective::ExecutionTime => &self.exec,
            Objective::EnergyDelay => &self.edp,
        }
    }

    pub fn for_objective_mut(&mut self, objective: Objective) -> &mut Configuration {
        match objective {
            Objective::ExecutionTime => &mut self.exec,
            Objective::EnergyDelay => &mut self.edp,
        }
    }
}
