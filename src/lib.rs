//! Cifer GA - a seeded genetic algorithm core for classical cipher search.
//!
//! The engine evolves a fixed-size population of integer gene sequences
//! toward a target using tournament selection, single-point crossover,
//! per-gene mutation and elitism. Scoring is pluggable through
//! [`FitnessFunction`]; the built-in score is Hamming similarity.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, progress and result types
//! - `compute`: Members, genetic operators and the generation engine
//!
//! # Example
//!
//! ```rust,no_run
//! use cifer_ga::{EvolutionConfig, EvolutionEngine, StopReason};
//!
//! let mut engine = EvolutionEngine::hamming(EvolutionConfig::default()).unwrap();
//! let result = engine.run().unwrap();
//!
//! if result.stats.stop_reason == StopReason::TargetReached {
//!     println!("Solved at generation {}", result.stats.generations);
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{EvolutionEngine, EvolutionError, FitnessFunction, HammingSimilarity, Member};
pub use schema::{EvolutionConfig, EvolutionResult, Gene, StopReason};
