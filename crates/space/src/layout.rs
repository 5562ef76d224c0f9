//! Parameter accessors for the cache fields of a configuration.
//!
//! Cache geometry is stored as power-of-two select indices. The layout names
//! which field holds which index and expands them into byte quantities.

use crate::configuration::Configuration;
use serde::{Deserialize, Serialize};

pub const KIB: u64 = 1024;

/// Field positions of the cache parameters inside a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheLayout {
    pub dl1_block: usize,
    pub dl1_sets: usize,
    pub dl1_assoc: usize,
    pub il1_block: usize,
    pub il1_sets: usize,
    pub il1_assoc: usize,
    pub ul2_sets: usize,
    pub ul2_block: usize,
    pub ul2_assoc: usize,
    /// Instruction fetch queue width in bytes.
    pub ifq_width: u64,
}

impl Default for CacheLayout {
    /// Layout of the default space, where both L1 caches share field 2 for
    /// their block size.
    fn default() -> Self {
        Self {
            dl1_block: 2,
            dl1_sets: 3,
            dl1_assoc: 4,
            il1_block: 2,
            il1_sets: 5,
            il1_assoc: 6,
            ul2_sets: 7,
            ul2_block: 8,
            ul2_assoc: 9,
            ifq_width: 8,
        }
    }
}

fn field(config: &Configuration, index: usize) -> u64 {
    config.param(index).unwrap_or(0) as u64
}

// Select indices far past any real cardinality would overflow the shift.
fn shifted(base: u64, index: u64) -> u64 {
    if index >= 48 {
        u64::MAX
    } else {
        base << index
    }
}

impl CacheLayout {
    pub fn dl1_block_size(&self, config: &Configuration) -> u64 {
        shifted(8, field(config, self.dl1_block))
    }

    pub fn il1_block_size(&self, config: &Configuration) -> u64 {
        shifted(8, field(config, self.il1_block))
    }

    pub fn ul2_block_size(&self, config: &Configuration) -> u64 {
        shifted(16, field(config, self.ul2_block))
    }

    /// Associativity select indices; the way count is `1 << index`.
    pub fn dl1_assoc_index(&self, config: &Configuration) -> u32 {
        field(config, self.dl1_assoc) as u32
    }

    pub fn il1_assoc_index(&self, config: &Configuration) -> u32 {
        field(config, self.il1_assoc) as u32
    }

    pub fn ul2_assoc_index(&self, config: &Configuration) -> u32 {
        field(config, self.ul2_assoc) as u32
    }

    /// L1 data cache capacity in bytes.
    pub fn dl1_size(&self, config: &Configuration) -> u64 {
        shifted(32, field(config, self.dl1_sets))
            .saturating_mul(shifted(1, field(config, self.dl1_assoc)))
            .saturating_mul(self.dl1_block_size(config))
    }

    /// L1 instruction cache capacity in bytes.
    pub fn il1_size(&self, config: &Configuration) -> u64 {
        shifted(32, field(config, self.il1_sets))
            .saturating_mul(shifted(1, field(config, self.il1_assoc)))
            .saturating_mul(self.il1_block_size(config))
    }

    /// Unified L2 capacity in bytes.
    pub fn ul2_size(&self, config: &Configuration) -> u64 {
        shifted(256, field(config, self.ul2_sets))
            .saturating_mul(shifted(1, field(config, self.ul2_assoc)))
            .saturating_mul(self.ul2_block_size(config))
    }
}

/// The latency enumeration shared with the evaluator.
///
/// The dependent latency fields hold indices into this table, not cycle
/// counts: L1 index `i` means `l1_min_cycles + i` cycles and ul2 index `i`
/// means `ul2_min_cycles + i` cycles. The offsets map the smallest legal
/// size/associativity combination to index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyTable {
    pub l1_min_cycles: u32,
    pub ul2_min_cycles: u32,
    /// Subtracted from `log2(size_kb) + assoc_index` for both L1 caches.
    pub l1_offset: u32,
    /// ul2 sizes are measured in units of this many KiB before the log.
    pub ul2_base_kb: u64,
    pub ul2_offset: u32,
}

impl Default for LatencyTable {
    fn default() -> Self {
        Self {
            l1_min_cycles: 1,
            ul2_min_cycles: 5,
            l1_offset: 1,
            ul2_base_kb: 32,
            ul2_offset: 0,
        }
    }
}

impl LatencyTable {
    pub fn l1_cycles(&self, index: u32) -> u32 {
        self.l1_min_cycles + index
    }

    pub fn ul2_cycles(&self, index: u32) -> u32 {
        self.ul2_min_cycles + index
    }
}
