//! Schema module - Configuration, progress and result types for genetic search.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
