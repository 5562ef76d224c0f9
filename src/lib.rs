//! Coordinate-descent design-space exploration for processor and cache
//! configurations.

pub use archdse_driver as driver;
pub use archdse_explorer as explorer;
pub use archdse_space as space;
