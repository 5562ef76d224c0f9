//! Configuration legality checks.

use archdse_space::{CacheLayout, Configuration, DesignSpace, KIB};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const L1_MIN_SIZE: u64 = 2 * KIB;
pub const L1_MAX_SIZE: u64 = 64 * KIB;
pub const UL2_MIN_SIZE: u64 = 32 * KIB;
pub const UL2_MAX_SIZE: u64 = 1024 * KIB;
pub const UL2_MAX_BLOCK: u64 = 128;

/// Legality predicate over complete configurations.
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `config` may be handed to the evaluator.
    fn is_valid(&self, space: &DesignSpace, config: &Configuration) -> bool;
}

/// Accepts every structurally well-formed configuration.
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn name(&self) -> &str {
        "accept-all"
    }

    fn is_valid(&self, space: &DesignSpace, config: &Configuration) -> bool {
        space.is_well_formed(config)
    }
}

/// First rule a configuration breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// Instruction block narrower than the fetch queue.
    FetchWidth { il1_block: u64, ifq_width: u64 },
    /// L1 instruction and data caches must share a block size.
    L1BlockMismatch { il1_block: u64, dl1_block: u64 },
    /// Unified block must be at least twice the L1 block and at most 128 bytes.
    Ul2Block { ul2_block: u64, il1_block: u64 },
    /// Unified cache must hold at least twice both L1 caches.
    Ul2Capacity { ul2_size: u64, l1_total: u64 },
    Il1Size { size: u64 },
    Dl1Size { size: u64 },
    Ul2Size { size: u64 },
    /// Wrong field count or a field outside its cardinality.
    Malformed,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::FetchWidth { il1_block, ifq_width } => write!(
                f,
                "il1 block size {}B is below the fetch queue width {}B",
                il1_block, ifq_width
            ),
            Violation::L1BlockMismatch { il1_block, dl1_block } => write!(
                f,
                "il1 block size {}B differs from dl1 block size {}B",
                il1_block, dl1_block
            ),
            Violation::Ul2Block { ul2_block, il1_block } => write!(
                f,
                "ul2 block size {}B must be in [2 x {}B, {}B]",
                ul2_block, il1_block, UL2_MAX_BLOCK
            ),
            Violation::Ul2Capacity { ul2_size, l1_total } => write!(
                f,
                "ul2 size {}B is less than twice the L1 total {}B",
                ul2_size, l1_total
            ),
            Violation::Il1Size { size } => write!(f, "il1 size {}B outside [2KiB, 64KiB]", size),
            Violation::Dl1Size { size } => write!(f, "dl1 size {}B outside [2KiB, 64KiB]", size),
            Violation::Ul2Size { size } => write!(f, "ul2 size {}B outside [32KiB, 1024KiB]", size),
            Violation::Malformed => f.write_str("configuration does not match the design space"),
        }
    }
}

/// Expanded cache quantities, all in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    pub dl1_block: u64,
    pub il1_block: u64,
    pub ul2_block: u64,
    pub dl1_size: u64,
    pub il1_size: u64,
    pub ul2_size: u64,
    pub ifq_width: u64,
}

impl CacheGeometry {
    pub fn of(layout: &CacheLayout, config: &Configuration) -> Self {
        Self {
            dl1_block: layout.dl1_block_size(config),
            il1_block: layout.il1_block_size(config),
            ul2_block: layout.ul2_block_size(config),
            dl1_size: layout.dl1_size(config),
            il1_size: layout.il1_size(config),
            ul2_size: layout.ul2_size(config),
            ifq_width: layout.ifq_width,
        }
    }

    /// First cache rule this geometry breaks, if any. Bounds are inclusive.
    pub fn violation(&self) -> Option<Violation> {
        if self.il1_block < self.ifq_width {
            return Some(Violation::FetchWidth {
                il1_block: self.il1_block,
                ifq_width: self.ifq_width,
            });
        }
        if self.il1_block != self.dl1_block {
            return Some(Violation::L1BlockMismatch {
                il1_block: self.il1_block,
                dl1_block: self.dl1_block,
            });
        }
        if self.ul2_block < self.il1_block.saturating_mul(2) || self.ul2_block > UL2_MAX_BLOCK {
            return Some(Violation::Ul2Block {
                ul2_block: self.ul2_block,
                il1_block: self.il1_block,
            });
        }
        let l1_total = self.il1_size.saturating_add(self.dl1_size);
        if self.ul2_size < l1_total.saturating_mul(2) {
            return Some(Violation::Ul2Capacity {
                ul2_size: self.ul2_size,
                l1_total,
            });
        }
        if !(L1_MIN_SIZE..=L1_MAX_SIZE).contains(&self.il1_size) {
            return Some(Violation::Il1Size { size: self.il1_size });
        }
        if !(L1_MIN_SIZE..=L1_MAX_SIZE).contains(&self.dl1_size) {
            return Some(Violation::Dl1Size { size: self.dl1_size });
        }
        if !(UL2_MIN_SIZE..=UL2_MAX_SIZE).contains(&self.ul2_size) {
            return Some(Violation::Ul2Size { size: self.ul2_size });
        }
        None
    }
}

/// Cache-hierarchy rules for the processor/cache space.
#[derive(Debug, Clone, Default)]
pub struct CacheValidator {
    layout: CacheLayout,
}

impl CacheValidator {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn violation(&self, space: &DesignSpace, config: &Configuration) -> Option<Violation> {
        CacheGeometry::of(&self.layout, config)
            .violation()
            .or_else(|| (!space.is_well_formed(config)).then_some(Violation::Malformed))
    }
}

impl Validator for CacheValidator {
    fn name(&self) -> &str {
        "cache-hierarchy"
    }

    fn is_valid(&self, space: &DesignSpace, config: &Configuration) -> bool {
        self.violation(space, config).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 32B L1 blocks, 4 KiB L1s, 64B ul2 blocks, 256 KiB ul2.
    const VALID: &str = "1 0 2 1 1 1 1 3 2 1 0 0 1 1 1 2 2 4";

    fn geometry() -> CacheGeometry {
        CacheGeometry {
            dl1_block: 32,
            il1_block: 32,
            ul2_block: 64,
            dl1_size: 8 * KIB,
            il1_size: 8 * KIB,
            ul2_size: 256 * KIB,
            ifq_width: 8,
        }
    }

    #[test]
    fn test_reference_configuration_is_valid() {
        let space = DesignSpace::default();
        let config: Configuration = VALID.parse().unwrap();
        assert_eq!(CacheValidator::default().violation(&space, &config), None);
        assert!(CacheValidator::default().is_valid(&space, &config));
    }

    #[test]
    fn test_block_size_rules() {
        let mut g = geometry();
        g.dl1_block = 16;
        assert!(matches!(g.violation(), Some(Violation::L1BlockMismatch { .. })));

        let mut g = geometry();
        g.il1_block = 4;
        g.dl1_block = 4;
        assert!(matches!(g.violation(), Some(Violation::FetchWidth { .. })));

        let mut g = geometry();
        g.il1_block = 8;
        g.dl1_block = 8;
        g.ul2_block = 15;
        assert!(matches!(g.violation(), Some(Violation::Ul2Block { .. })));
        g.ul2_block = 16;
        assert_eq!(g.violation(), None);

        let mut g = geometry();
        g.ul2_block = 256;
        assert!(matches!(g.violation(), Some(Violation::Ul2Block { .. })));
        g.ul2_block = 128;
        assert_eq!(g.violation(), None);
    }

    #[test]
    fn test_ul2_must_dominate_l1() {
        let mut g = geometry();
        g.il1_size = 64 * KIB;
        g.dl1_size = 64 * KIB;
        g.ul2_size = 128 * KIB;
        assert_eq!(
            g.violation(),
            Some(Violation::Ul2Capacity {
                ul2_size: 128 * KIB,
                l1_total: 128 * KIB
            })
        );
        g.ul2_size = 256 * KIB;
        assert_eq!(g.violation(), None);
    }

    #[test]
    fn test_l1_size_boundaries() {
        for size in [L1_MIN_SIZE, L1_MAX_SIZE] {
            let mut g = geometry();
            g.il1_size = size;
            g.dl1_size = size;
            assert_eq!(g.violation(), None, "size {}", size);
        }

        let mut g = geometry();
        g.il1_size = L1_MIN_SIZE - 1;
        assert!(matches!(g.violation(), Some(Violation::Il1Size { .. })));
        g.il1_size = L1_MAX_SIZE + 1;
        assert!(matches!(g.violation(), Some(Violation::Il1Size { .. })));

        let mut g = geometry();
        g.dl1_size = L1_MIN_SIZE - 1;
        assert!(matches!(g.violation(), Some(Violation::Dl1Size { .. })));
        g.dl1_size = L1_MAX_SIZE + 1;
        assert!(matches!(g.violation(), Some(Violation::Dl1Size { .. })));
    }

    #[test]
    fn test_ul2_size_boundaries() {
        let mut g = geometry();
        g.il1_size = L1_MIN_SIZE;
        g.dl1_size = L1_MIN_SIZE;
        for size in [UL2_MIN_SIZE, UL2_MAX_SIZE] {
            g.ul2_size = size;
            assert_eq!(g.violation(), None, "size {}", size);
        }
        g.ul2_size = UL2_MIN_SIZE - 1;
        assert!(matches!(g.violation(), Some(Violation::Ul2Size { .. })));
        g.ul2_size = UL2_MAX_SIZE + 1;
        assert!(matches!(g.violation(), Some(Violation::Ul2Size { .. })));
    }

    #[test]
    fn test_split_block_fields_must_agree() {
        // A layout with a separate il1 block field at index 15.
        let layout = CacheLayout {
            il1_block: 15,
            ..CacheLayout::default()
        };
        let cardinalities = vec![4, 2, 4, 9, 3, 9, 3, 10, 4, 5, 3, 2, 6, 4, 5, 4];
        let space = DesignSpace::new(cardinalities, 0, (0..16).collect()).unwrap();
        let validator = CacheValidator::new(layout);

        let same: Configuration = "1 0 2 1 1 1 1 3 2 1 0 0 1 1 1 2".parse().unwrap();
        assert!(validator.is_valid(&space, &same));

        let differs: Configuration = "1 0 2 1 1 1 1 3 2 1 0 0 1 1 1 1".parse().unwrap();
        assert_eq!(
            validator.violation(&space, &differs),
            Some(Violation::L1BlockMismatch { il1_block: 16, dl1_block: 32 })
        );
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        let space = DesignSpace::default();
        let config: Configuration = "1 0 2 1 1 1 1 3 2 1 0 0 1 1 1".parse().unwrap();
        assert_eq!(
            CacheValidator::default().violation(&space, &config),
            Some(Violation::Malformed)
        );

        let mut params = VALID.parse::<Configuration>().unwrap().params().to_vec();
        params[17] = 10;
        let out_of_range = Configuration::new(params);
        assert!(!CacheValidator::default().is_valid(&space, &out_of_range));
    }

    #[test]
    fn test_accept_all_checks_structure_only() {
        let space = DesignSpace::new(vec![2, 2], 0, vec![0, 1]).unwrap();
        assert!(AcceptAll.is_valid(&space, &"1 1".parse().unwrap()));
        assert!(!AcceptAll.is_valid(&space, &"1 2".parse().unwrap()));
    }
}
