//! Evolutionary search over fixed-length integer solutions.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Fitness Functions** (`fitness`): Pluggable scoring against a target
//! - **Genome Operations** (`genome`): Members, random generation, crossover, and mutation
//! - **Selection** (`selection`): Ranking and tournament selection
//! - **Search Algorithms** (`search`): The generation engine
//!
//! # Example
//!
//! ```rust,no_run
//! use cifer_ga::compute::evolution::EvolutionEngine;
//! use cifer_ga::schema::EvolutionConfig;
//!
//! let config = EvolutionConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::hamming(config).expect("valid config");
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!("Generation {}: {}%", progress.generation, progress.fitness_percent);
//!     })
//!     .expect("fitness evaluation");
//!
//! println!("Best: {:?} ({:?})", result.best.genes, result.stats.stop_reason);
//! ```

mod fitness;
mod genome;
mod search;
mod selection;

pub use fitness::{FitnessError, FitnessFunction, HammingSimilarity, hamming_similarity};
pub use genome::{GenomeRng, Member, genome_distance};
pub use search::{EvolutionEngine, EvolutionError};
pub use selection::{rank, select, tournament_index};
