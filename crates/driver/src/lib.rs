//! Driver loop around the explorer: evaluation, best tracking and reports.

#[cfg(feature = "cli")]
pub mod cli;
pub mod evaluator;
pub mod report;
pub mod session;

#[cfg(feature = "cli")]
pub use cli::*;
pub use evaluator::*;
pub use report::*;
pub use session::*;
