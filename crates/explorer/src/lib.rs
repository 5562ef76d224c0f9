//! Coordinate-descent exploration of processor/cache design spaces.
//!
//! # Key Components
//!
//! - [`validator::Validator`]: legality predicate over a full configuration
//! - [`latency::DependentDeriver`]: computes the dependent (latency) fields
//! - [`explorer::Explorer`]: proposes the next unexplored valid configuration
//!   and decides when the search has converged

pub mod explorer;
pub mod latency;
pub mod objective;
pub mod validator;

pub use explorer::{
    Completion, Explorer, ExplorerConfig, Proposal, SearchCursor, SearchStatus, TraversalMode,
};
pub use latency::{DependentDeriver, LatencyDeriver, Latencies, NoDependents};
pub use objective::{BestKnown, Objective};
pub use validator::{AcceptAll, CacheGeometry, CacheValidator, Validator, Violation};
