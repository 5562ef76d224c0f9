//! Dependent-parameter derivation.

use archdse_space::{CacheLayout, Configuration, DesignSpace, LatencyTable, KIB};
use serde::{Deserialize, Serialize};

/// Computes the dependent fields of a configuration from its independent ones.
pub trait DependentDeriver: Send + Sync {
    /// Number of fields `derive` produces.
    fn arity(&self) -> usize;

    fn derive(&self, space: &DesignSpace, independent: &[u32]) -> Vec<u32>;
}

/// For spaces without dependent fields.
pub struct NoDependents;

impl DependentDeriver for NoDependents {
    fn arity(&self) -> usize {
        0
    }

    fn derive(&self, _space: &DesignSpace, _independent: &[u32]) -> Vec<u32> {
        Vec::new()
    }
}

/// Latency-table indices for the three caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latencies {
    pub dl1: u32,
    pub il1: u32,
    pub ul2: u32,
}

fn log2_floor(value: u64) -> u32 {
    value.checked_ilog2().unwrap_or(0)
}

/// Derives cache access latencies from cache capacity and associativity.
///
/// Each latency is `log2(size) + log2(ways)` minus the table offset, where
/// the way count's log is just its select index.
#[derive(Debug, Clone, Default)]
pub struct LatencyDeriver {
    layout: CacheLayout,
    table: LatencyTable,
}

impl LatencyDeriver {
    pub fn new(layout: CacheLayout, table: LatencyTable) -> Self {
        Self { layout, table }
    }

    pub fn table(&self) -> &LatencyTable {
        &self.table
    }

    pub fn latencies(&self, config: &Configuration) -> Latencies {
        let l1 = |size: u64, assoc: u32| {
            log2_floor(size / KIB)
                .saturating_add(assoc)
                .saturating_sub(self.table.l1_offset)
        };
        let ul2_unit = self.table.ul2_base_kb.max(1) * KIB;

        Latencies {
            dl1: l1(self.layout.dl1_size(config), self.layout.dl1_assoc_index(config)),
            il1: l1(self.layout.il1_size(config), self.layout.il1_assoc_index(config)),
            ul2: log2_floor(self.layout.ul2_size(config) / ul2_unit)
                .saturating_add(self.layout.ul2_assoc_index(config))
                .saturating_sub(self.table.ul2_offset),
        }
    }
}

impl DependentDeriver for LatencyDeriver {
    fn arity(&self) -> usize {
        3
    }

    fn derive(&self, _space: &DesignSpace, independent: &[u32]) -> Vec<u32> {
        let partial = Configuration::new(independent.to_vec());
        let lat = self.latencies(&partial);
        vec![lat.dl1, lat.il1, lat.ul2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn independent(s: &str) -> Vec<u32> {
        s.parse::<Configuration>().unwrap().params().to_vec()
    }

    #[test]
    fn test_reference_latencies() {
        let space = DesignSpace::default();
        // 4 KiB 2-way L1s, 256 KiB 2-way ul2.
        let derived = LatencyDeriver::default()
            .derive(&space, &independent("1 0 2 1 1 1 1 3 2 1 0 0 1 1 1"));
        assert_eq!(derived, vec![2, 2, 4]);
    }

    #[test]
    fn test_smallest_legal_caches_map_to_zero() {
        let space = DesignSpace::default();
        // 8B blocks x 256 sets = 2 KiB direct-mapped L1s; 16B x 2048 sets = 32 KiB ul2.
        let derived = LatencyDeriver::default()
            .derive(&space, &independent("0 0 0 3 0 3 0 3 0 0 0 0 0 0 0"));
        assert_eq!(derived, vec![0, 0, 0]);
    }

    #[test]
    fn test_largest_legal_caches_fit_the_space() {
        let space = DesignSpace::default();
        // 64 KiB 4-way L1s, 1024 KiB 16-way ul2.
        let params = independent("0 0 3 3 2 3 2 1 3 4 0 0 0 0 0");
        let deriver = LatencyDeriver::default();
        let derived = deriver.derive(&space, &params);
        assert_eq!(derived, vec![7, 7, 9]);
        for (i, value) in derived.iter().enumerate() {
            assert!(*value < space.cardinality(15 + i));
        }
        assert_eq!(deriver.table().l1_cycles(derived[0]), 8);
        assert_eq!(deriver.table().ul2_cycles(derived[2]), 14);
    }

    #[test]
    fn test_associativity_raises_latency() {
        let space = DesignSpace::default();
        let deriver = LatencyDeriver::default();
        let direct = deriver.derive(&space, &independent("0 0 2 1 0 1 0 3 2 0 0 0 0 0 0"));
        let two_way = deriver.derive(&space, &independent("0 0 2 1 1 1 0 3 2 0 0 0 0 0 0"));
        assert_eq!(two_way[0], direct[0] + 2);
        assert_eq!(two_way[1], direct[1]);
    }

    #[test]
    fn test_deterministic_and_total() {
        let space = DesignSpace::default();
        let deriver = LatencyDeriver::default();
        let params = independent("3 1 1 4 2 2 1 5 3 3 2 1 5 3 4");
        assert_eq!(deriver.derive(&space, &params), deriver.derive(&space, &params));

        // Tiny caches saturate at zero instead of underflowing.
        assert_eq!(deriver.derive(&space, &[]), vec![0, 0, 0]);
    }

    #[test]
    fn test_huge_associativity_saturates() {
        let space = DesignSpace::default();
        let deriver = LatencyDeriver::default();
        let mut params = vec![0; 15];
        params[4] = u32::MAX;
        params[6] = u32::MAX;
        params[9] = u32::MAX;
        let derived = deriver.derive(&space, &params);
        assert_eq!(derived, vec![u32::MAX - 1, u32::MAX - 1, u32::MAX]);
    }
}
