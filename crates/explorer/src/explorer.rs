//! Coordinate-descent proposal engine.
//!
//! One dimension is varied at a time, in the space's exploration order, while
//! every other independent dimension is held at the best-known value for the
//! selected objective. A traversal visits every choice of every independent
//! dimension once; depending on [`TraversalMode`] the search stops after one
//! traversal or repeats until two consecutive traversals end on the same
//! candidate.

use crate::latency::DependentDeriver;
use crate::objective::{BestKnown, Objective};
use crate::validator::Validator;
use anyhow::{ensure, Result};
use archdse_space::{Configuration, DesignSpace, VisitedSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalMode {
    /// Stop after one traversal of the exploration order.
    SinglePass,
    /// Repeat traversals until one ends where the previous one did.
    UntilFixedPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub mode: TraversalMode,
    /// Hard cap on traversals for [`TraversalMode::UntilFixedPoint`].
    pub max_traversals: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            mode: TraversalMode::UntilFixedPoint,
            max_traversals: 16,
        }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    Converged,
    /// A whole traversal produced nothing new and valid.
    Exhausted,
    TraversalLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    Exploring,
    Complete(Completion),
}

/// Result of one [`Explorer::propose_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// A valid configuration absent from the visited set.
    Candidate(Configuration),
    /// The search is over; `configuration` is the caller's input, unchanged.
    Complete {
        configuration: Configuration,
        reason: Completion,
    },
}

impl Proposal {
    pub fn configuration(&self) -> &Configuration {
        match self {
            Proposal::Candidate(config) => config,
            Proposal::Complete { configuration, .. } => configuration,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Proposal::Complete { .. })
    }
}

/// Mutable search position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCursor {
    /// Index into the exploration order.
    pub position: usize,
    /// Next choice to try for the dimension at `position`.
    pub choice: u32,
    pub traversals: usize,
    /// Fresh candidates handed out during the current traversal.
    pub fresh_in_traversal: usize,
    /// Last candidate of the previous traversal.
    pub previous_final: Option<Configuration>,
    pub status: SearchStatus,
}

impl Default for SearchCursor {
    fn default() -> Self {
        Self {
            position: 0,
            choice: 0,
            traversals: 0,
            fresh_in_traversal: 0,
            previous_final: None,
            status: SearchStatus::Exploring,
        }
    }
}

pub struct Explorer {
    space: DesignSpace,
    validator: Arc<dyn Validator>,
    deriver: Arc<dyn DependentDeriver>,
    config: ExplorerConfig,
    cursor: SearchCursor,
}

impl Explorer {
    pub fn new(
        space: DesignSpace,
        validator: Arc<dyn Validator>,
        deriver: Arc<dyn DependentDeriver>,
        config: ExplorerConfig,
    ) -> Result<Self> {
        space.check()?;
        ensure!(
            deriver.arity() == space.num_dependent(),
            "deriver produces {} fields but the space has {} dependent dimensions",
            deriver.arity(),
            space.num_dependent()
        );
        ensure!(config.max_traversals > 0, "max_traversals must be at least 1");
        Ok(Self {
            space,
            validator,
            deriver,
            config,
            cursor: SearchCursor::default(),
        })
    }

    pub fn space(&self) -> &DesignSpace {
        &self.space
    }

    pub fn validator(&self) -> &dyn Validator {
        self.validator.as_ref()
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn cursor(&self) -> &SearchCursor {
        &self.cursor
    }

    pub fn status(&self) -> SearchStatus {
        self.cursor.status
    }

    pub fn traversals(&self) -> usize {
        self.cursor.traversals
    }

    /// Forget all progress and start over from the first dimension.
    pub fn reset(&mut self) {
        self.cursor = SearchCursor::default();
    }

    /// Dimension currently being varied, if the search is still running.
    pub fn current_dimension(&self) -> Option<usize> {
        match self.cursor.status {
            SearchStatus::Exploring => self.space.order().get(self.cursor.position).copied(),
            SearchStatus::Complete(_) => None,
        }
    }

    /// Recompute the dependent fields of `config` from its independent ones.
    pub fn complete(&self, config: &Configuration) -> Configuration {
        let independent = config.independent(self.space.num_independent());
        let dependent = self.deriver.derive(&self.space, independent);
        Configuration::from_parts(independent, &dependent)
    }

    /// Propose the next configuration to evaluate.
    ///
    /// Invalid and already-visited candidates are skipped internally. Once the
    /// search is complete every call returns `current` unchanged.
    pub fn propose_next(
        &mut self,
        current: &Configuration,
        best: &BestKnown,
        objective: Objective,
        visited: &VisitedSet,
    ) -> Proposal {
        let reference = best.for_objective(objective);

        loop {
            if let SearchStatus::Complete(reason) = self.cursor.status {
                return Proposal::Complete {
                    configuration: current.clone(),
                    reason,
                };
            }

            let candidate = self.build_candidate(reference);
            let valid = self.validator.is_valid(&self.space, &candidate);
            let fresh = valid && !visited.contains(&candidate);
            debug!(
                candidate = %candidate,
                dimension = self.space.order()[self.cursor.position],
                choice = self.cursor.choice,
                valid,
                fresh,
                "built candidate"
            );
            if fresh {
                self.cursor.fresh_in_traversal += 1;
            }

            if self.advance() {
                self.finish_traversal(&candidate);
            }

            if fresh {
                return Proposal::Candidate(candidate);
            }
        }
    }

    /// Best-known values everywhere except the dimension under exploration,
    /// then dependent fields recomputed from the result.
    fn build_candidate(&self, reference: &Configuration) -> Configuration {
        let num_independent = self.space.num_independent();
        let mut independent = vec![0; num_independent];
        for (slot, value) in independent.iter_mut().zip(reference.params()) {
            *slot = *value;
        }
        let dim = self.space.order()[self.cursor.position];
        independent[dim] = self.cursor.choice;

        let dependent = self.deriver.derive(&self.space, &independent);
        Configuration::from_parts(&independent, &dependent)
    }

    /// Step the choice cursor. Returns `true` when the step ends a traversal.
    fn advance(&mut self) -> bool {
        let dim = self.space.order()[self.cursor.position];
        let ceiling = self.space.cardinality(dim).saturating_sub(1);
        if self.cursor.choice >= ceiling {
            debug!(dimension = dim, "dimension exhausted");
            self.cursor.position += 1;
            self.cursor.choice = 0;
        } else {
            self.cursor.choice += 1;
        }
        self.cursor.position >= self.space.order().len()
    }

    fn finish_traversal(&mut self, last: &Configuration) {
        self.cursor.traversals += 1;
        let fresh = self.cursor.fresh_in_traversal;

        let outcome = match self.config.mode {
            TraversalMode::SinglePass if fresh > 0 => Some(Completion::Converged),
            TraversalMode::SinglePass => Some(Completion::Exhausted),
            TraversalMode::UntilFixedPoint => {
                if self.cursor.previous_final.as_ref() == Some(last) {
                    Some(Completion::Converged)
                } else if fresh == 0 {
                    Some(Completion::Exhausted)
                } else if self.cursor.traversals >= self.config.max_traversals {
                    Some(Completion::TraversalLimit)
                } else {
                    None
                }
            }
        };

        info!(
            traversal = self.cursor.traversals,
            fresh,
            last = %last,
            outcome = ?outcome,
            "traversal finished"
        );

        match outcome {
            Some(reason) => self.cursor.status = SearchStatus::Complete(reason),
            None => {
                self.cursor.previous_final = Some(last.clone());
                self.cursor.position = 0;
                self.cursor.choice = 0;
                self.cursor.fresh_in_traversal = 0;
            }
        }
    }
}
