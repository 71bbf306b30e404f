//! Upstream data sources.

pub mod memory;
pub mod provider;

pub use memory::LocalProvider;
pub use provider::{DataProvider, OverlapRecord};
