//! Configuration model for architectural design-space exploration.

pub mod configuration;
pub mod layout;
pub mod space;

pub use configuration::*;
pub use layout::*;
pub use space::*;
