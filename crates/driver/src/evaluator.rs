//! Evaluators measure a configuration's performance and energy.

use anyhow::{ensure, Result};
use archdse_explorer::LatencyDeriver;
use archdse_space::{CacheLayout, Configuration, LatencyTable, KIB};
use serde::{Deserialize, Serialize};

/// Cost of one configuration under the evaluator's workload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Execution time in milliseconds.
    pub execution_time: f64,
    /// Energy in millijoules.
    pub energy: f64,
}

impl Measurement {
    /// Energy-delay product.
    pub fn edp(&self) -> f64 {
        self.energy * self.execution_time
    }
}

/// Something that can score a configuration, e.g. a simulator run.
pub trait Evaluator {
    fn name(&self) -> &str;

    fn evaluate(&mut self, config: &Configuration) -> Result<Measurement>;
}

/// Closed-form cost model over the default processor/cache layout.
///
/// Not a simulator: it gives the search a deterministic, roughly plausible
/// landscape (bigger caches miss less but cost latency and energy, wider
/// cores retire faster but burn more power).
#[derive(Debug, Clone)]
pub struct AnalyticEvaluator {
    layout: CacheLayout,
    table: LatencyTable,
    /// Dynamic instruction count of the modelled workload.
    pub instructions: f64,
    /// Core clock in GHz.
    pub clock_ghz: f64,
    evaluations: usize,
}

impl Default for AnalyticEvaluator {
    fn default() -> Self {
        Self {
            layout: CacheLayout::default(),
            table: LatencyTable::default(),
            instructions: 1.0e8,
            clock_ghz: 1.0,
            evaluations: 0,
        }
    }
}

fn miss_rate(base: f64, size: u64, reference: u64, assoc_index: u32) -> f64 {
    let capacity = (reference as f64 / size.max(1) as f64).sqrt();
    (base * capacity / (1.0 + 0.25 * assoc_index as f64)).min(1.0)
}

impl AnalyticEvaluator {
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn field(config: &Configuration, index: usize) -> f64 {
        config.param(index).unwrap_or(0) as f64
    }
}

impl Evaluator for AnalyticEvaluator {
    fn name(&self) -> &str {
        "analytic"
    }

    fn evaluate(&mut self, config: &Configuration) -> Result<Measurement> {
        ensure!(config.len() >= 18, "analytic model expects 18 fields, got {}", config.len());
        self.evaluations += 1;

        let layout = &self.layout;
        let latencies = LatencyDeriver::new(*layout, self.table).latencies(config);
        let dl1_cycles = self.table.l1_cycles(latencies.dl1) as f64;
        let il1_cycles = self.table.l1_cycles(latencies.il1) as f64;
        let ul2_cycles = self.table.ul2_cycles(latencies.ul2) as f64;

        let dl1_size = layout.dl1_size(config);
        let il1_size = layout.il1_size(config);
        let ul2_size = layout.ul2_size(config);
        let dl1_miss = miss_rate(0.08, dl1_size, 8 * KIB, layout.dl1_assoc_index(config));
        let il1_miss = miss_rate(0.03, il1_size, 8 * KIB, layout.il1_assoc_index(config));
        let ul2_miss = miss_rate(0.25, ul2_size, 128 * KIB, layout.ul2_assoc_index(config));
        const MEMORY_CYCLES: f64 = 120.0;

        let width = 2f64.powf(Self::field(config, 0));
        let fetch = Self::field(config, 1) + 1.0;
        let fp_width = Self::field(config, 11) + 1.0;
        let predictor = Self::field(config, 12);
        let ras = Self::field(config, 13);
        let btb = Self::field(config, 14);

        let issue_cpi = 1.0 / width.min(2.0 * fetch) + 0.15 / fp_width;
        let mispredict = 0.08 / (1.0 + 0.4 * predictor + 0.1 * ras + 0.1 * btb);
        let branch_cpi = 0.2 * mispredict * (6.0 + width);
        let memory_cpi = 0.35 * (dl1_cycles - 1.0)
            + 0.35 * dl1_miss * (ul2_cycles + ul2_miss * MEMORY_CYCLES)
            + 0.15 * (il1_cycles - 1.0)
            + il1_miss * (ul2_cycles + ul2_miss * MEMORY_CYCLES);
        let cpi = issue_cpi + branch_cpi + memory_cpi;

        let cycles = self.instructions * cpi;
        let execution_time = cycles / (self.clock_ghz * 1.0e6);

        // nJ per access and mW of leakage per KiB, all loosely scaled.
        let kib = |bytes: u64| bytes as f64 / KIB as f64;
        let access_energy = self.instructions
            * (0.35 * (0.02 + 0.002 * kib(dl1_size).sqrt())
                + (0.02 + 0.002 * kib(il1_size).sqrt())
                + (0.35 * dl1_miss + il1_miss) * (0.1 + 0.001 * kib(ul2_size).sqrt()))
            * 1.0e-6;
        let core_power = 20.0 * width.sqrt() * fetch.sqrt() + 5.0 * fp_width;
        let leakage_power = 0.05 * (kib(dl1_size) + kib(il1_size)) + 0.01 * kib(ul2_size);
        let energy = access_energy + (core_power + leakage_power) * execution_time * 1.0e-3;

        Ok(Measurement {
            execution_time,
            energy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(s: &str) -> Configuration {
        s.parse().unwrap()
    }

    #[test]
    fn test_edp() {
        let m = Measurement {
            execution_time: 2.0,
            energy: 3.0,
        };
        assert_eq!(m.edp(), 6.0);
    }

    #[test]
    fn test_deterministic_and_positive() {
        let mut evaluator = AnalyticEvaluator::default();
        let c = config("1 0 2 1 1 1 1 3 2 1 0 0 1 1 1 2 2 4");
        let a = evaluator.evaluate(&c).unwrap();
        let b = evaluator.evaluate(&c).unwrap();
        assert_eq!(a, b);
        assert!(a.execution_time > 0.0 && a.energy > 0.0);
        assert_eq!(evaluator.evaluations(), 2);
    }

    #[test]
    fn test_wider_core_runs_faster() {
        let mut evaluator = AnalyticEvaluator::default();
        let narrow = evaluator
            .evaluate(&config("0 0 2 1 1 1 1 3 2 1 0 0 1 1 1 2 2 4"))
            .unwrap();
        let wide = evaluator
            .evaluate(&config("2 1 2 1 1 1 1 3 2 1 0 0 1 1 1 2 2 4"))
            .unwrap();
        assert!(wide.execution_time < narrow.execution_time);
    }

    #[test]
    fn test_rejects_short_configuration() {
        let mut evaluator = AnalyticEvaluator::default();
        assert!(evaluator.evaluate(&config("0 0 0")).is_err());
        assert_eq!(evaluator.evaluations(), 0);
    }
}
