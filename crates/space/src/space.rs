//! Design-space shape: per-dimension cardinalities and the exploration order.

use crate::configuration::Configuration;
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Dimension names of the default processor/cache space, in field order.
pub const DEFAULT_DIMENSION_NAMES: [&str; 18] = [
    "width",
    "fetchspeed",
    "l1block",
    "dl1sets",
    "dl1assoc",
    "il1sets",
    "il1assoc",
    "ul2sets",
    "ul2block",
    "ul2assoc",
    "replacepolicy",
    "fpwidth",
    "branchsettings",
    "ras",
    "btb",
    "dl1lat",
    "il1lat",
    "ul2lat",
];

const DEFAULT_CARDINALITIES: [u32; 18] = [4, 2, 4, 9, 3, 9, 3, 10, 4, 5, 3, 2, 6, 4, 5, 8, 8, 10];

// Caches first, then FPU, then core, then branch predictor.
const DEFAULT_ORDER: [usize; 15] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 0, 1, 12, 13, 14];

/// Shape of a discrete configuration space.
///
/// The last `num_dependent` dimensions are derived from the others and are
/// never chosen by the search; `order` is a permutation of the independent
/// dimension indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignSpace {
    cardinalities: Vec<u32>,
    num_dependent: usize,
    order: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    names: Vec<String>,
}

impl DesignSpace {
    pub fn new(cardinalities: Vec<u32>, num_dependent: usize, order: Vec<usize>) -> Result<Self> {
        let space = Self {
            cardinalities,
            num_dependent,
            order,
            names: Vec::new(),
        };
        space.check()?;
        Ok(space)
    }

    pub fn with_names(mut self, names: Vec<String>) -> Result<Self> {
        ensure!(
            names.len() == self.cardinalities.len(),
            "expected {} dimension names, got {}",
            self.cardinalities.len(),
            names.len()
        );
        self.names = names;
        Ok(self)
    }

    /// Re-run the construction invariants, e.g. after deserializing.
    pub fn check(&self) -> Result<()> {
        ensure!(!self.cardinalities.is_empty(), "design space has no dimensions");
        ensure!(
            self.num_dependent <= self.cardinalities.len(),
            "{} dependent dimensions exceed the {} total",
            self.num_dependent,
            self.cardinalities.len()
        );
        ensure!(
            self.num_independent() > 0,
            "design space has no independent dimensions to explore"
        );
        if let Some(dim) = self.cardinalities.iter().position(|&c| c == 0) {
            bail!("dimension {} has zero cardinality", dim);
        }

        let independent = self.num_independent();
        ensure!(
            self.order.len() == independent,
            "exploration order lists {} dimensions, expected {}",
            self.order.len(),
            independent
        );
        let mut seen = vec![false; independent];
        for &dim in &self.order {
            ensure!(dim < independent, "exploration order names dependent or unknown dimension {}", dim);
            ensure!(!seen[dim], "exploration order repeats dimension {}", dim);
            seen[dim] = true;
        }
        if !self.names.is_empty() {
            ensure!(
                self.names.len() == self.cardinalities.len(),
                "expected {} dimension names, got {}",
                self.cardinalities.len(),
                self.names.len()
            );
        }
        Ok(())
    }

    pub fn num_dims(&self) -> usize {
        self.cardinalities.len()
    }

    pub fn num_dependent(&self) -> usize {
        self.num_dependent
    }

    pub fn num_independent(&self) -> usize {
        self.cardinalities.len() - self.num_dependent
    }

    /// Number of legal choices for `dim`, or 0 if the dimension does not exist.
    pub fn cardinality(&self, dim: usize) -> u32 {
        self.cardinalities.get(dim).copied().unwrap_or(0)
    }

    pub fn cardinalities(&self) -> &[u32] {
        &self.cardinalities
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn name(&self, dim: usize) -> Option<&str> {
        self.names.get(dim).map(String::as_str)
    }

    /// Structural sanity: right length and every field within its cardinality.
    pub fn is_well_formed(&self, config: &Configuration) -> bool {
        config.len() == self.num_dims()
            && config
                .params()
                .iter()
                .zip(&self.cardinalities)
                .all(|(&value, &card)| value < card)
    }

    /// Number of points in the independent subspace (saturating).
    pub fn total_points(&self) -> u64 {
        self.cardinalities[..self.num_independent()]
            .iter()
            .fold(1u64, |acc, &c| acc.saturating_mul(c as u64))
    }

    /// The all-zero configuration, i.e. the smallest choice everywhere.
    pub fn origin(&self) -> Configuration {
        Configuration::zeros(self.num_dims())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("failed to read design space {}", path.display()))?;
        let space: Self = serde_json::from_slice(&data)
            .with_context(|| format!("failed to parse design space {}", path.display()))?;
        space.check()?;
        Ok(space)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        Ok(())
    }
}

impl Default for DesignSpace {
    /// The 18-dimension processor/cache space: 15 chosen fields followed by
    /// the dl1, il1 and ul2 latency indices.
    fn default() -> Self {
        Self {
            cardinalities: DEFAULT_CARDINALITIES.to_vec(),
            num_dependent: 3,
            order: DEFAULT_ORDER.to_vec(),
            names: DEFAULT_DIMENSION_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}
