//! Compute module - The genetic search core.

pub mod evolution;

pub use evolution::{EvolutionEngine, EvolutionError, FitnessFunction, HammingSimilarity, Member};
