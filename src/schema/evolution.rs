//! Evolution configuration types for the genetic search engine.
//!
//! This module provides the run configuration (population, operators, gene
//! space, target) together with the progress and result types the engine
//! hands back to its caller.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Gene, GeneConfig, default_target};

/// Top-level configuration for a genetic search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Shape of a candidate solution (length and gene alphabet).
    #[serde(default)]
    pub genes: GeneConfig,
    /// Reference solution defining the fitness landscape.
    #[serde(default = "default_target")]
    pub target: Vec<Gene>,
    /// Genetic operator settings.
    #[serde(default)]
    pub algorithm: GeneticAlgorithmConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Report progress every this many generations.
    #[serde(default = "default_report_interval")]
    pub report_interval: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            genes: GeneConfig::default(),
            target: default_target(),
            algorithm: GeneticAlgorithmConfig::default(),
            population: PopulationConfig::default(),
            report_interval: default_report_interval(),
            random_seed: None,
        }
    }
}

fn default_report_interval() -> usize {
    1
}

/// Genetic Algorithm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Number of candidates drawn per tournament.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Fraction of the population carried over unchanged (0.0-1.0).
    #[serde(default = "default_elite_rate")]
    pub elite_rate: f64,
    /// Mutation probability per gene (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            tournament_size: default_tournament_size(),
            elite_rate: default_elite_rate(),
            mutation_rate: default_mutation_rate(),
        }
    }
}

fn default_tournament_size() -> usize {
    3
}
fn default_elite_rate() -> f64 {
    0.10
}
fn default_mutation_rate() -> f64 {
    0.4
}

impl GeneticAlgorithmConfig {
    /// Number of elites for a population of `population_size`,
    /// `floor(population_size * elite_rate)`.
    pub fn elite_count(&self, population_size: usize) -> usize {
        ((population_size as f64 * self.elite_rate).floor() as usize).min(population_size)
    }
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stagnation limit: stop if no improvement for N generations.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            stagnation_limit: None,
        }
    }
}

fn default_population_size() -> usize {
    2048
}
fn default_max_generations() -> usize {
    1648
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update handed to reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number.
    pub generation: usize,
    /// Generation limit for the run.
    pub max_generations: usize,
    /// Best member of the current generation.
    pub best: Option<MemberSnapshot>,
    /// Best fitness as a percentage of the perfect score.
    pub fitness_percent: usize,
    /// Average fitness of current population.
    pub avg_fitness: f64,
    /// Generations since last improvement.
    pub stagnation_count: usize,
    /// Current phase of the algorithm.
    pub phase: EvolutionPhase,
}

/// Copy of a member's genes and fitness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MemberSnapshot {
    /// The solution vector.
    pub genes: Vec<Gene>,
    /// Fitness score.
    pub fitness: usize,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<usize>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Mean Hamming distance of the population to its best member.
    pub diversity: Vec<f64>,
}

/// Current phase of the generation state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Buffers filled with random members.
    #[default]
    Initialized,
    /// Computing fitness for every member.
    Evaluating,
    /// Population sorted by ascending fitness.
    Ranked,
    /// Building the next population.
    Reproducing,
    /// Run complete.
    Terminated,
}

/// Final result of evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best member found.
    pub best: MemberSnapshot,
    /// Generation at which `best` first appeared.
    pub best_generation: usize,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generation counter at termination.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: usize,
    /// Best fitness as a percentage of the perfect score.
    pub fitness_percent: usize,
    /// Average fitness of final population.
    pub final_avg_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Seed the run was started with.
    pub seed: u64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// A member reached the perfect score.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Target has {actual} genes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Target gene {gene} at index {index} is outside alphabet [0, {alphabet_size})")]
    GeneOutOfAlphabet {
        index: usize,
        gene: Gene,
        alphabet_size: Gene,
    },
    #[error("Elite rate {0} must be within [0, 1]")]
    InvalidEliteRate(f64),
    #[error("Mutation rate {0} must be within [0, 1]")]
    InvalidMutationRate(f64),
    #[error("Tournament size must be at least 1")]
    InvalidTournamentSize,
    #[error("Gene config validation failed: {0}")]
    GeneConfigError(#[from] super::ConfigError),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EvolutionConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EvolutionConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of elites carried between generations.
    pub fn elite_count(&self) -> usize {
        self.algorithm.elite_count(self.population.size)
    }

    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.genes.validate()?;

        if self.population.size == 0 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }

        if self.target.len() != self.genes.length {
            return Err(EvolutionConfigError::LengthMismatch {
                expected: self.genes.length,
                actual: self.target.len(),
            });
        }

        if let Some((index, &gene)) = self
            .target
            .iter()
            .enumerate()
            .find(|(_, g)| !self.genes.contains(**g))
        {
            return Err(EvolutionConfigError::GeneOutOfAlphabet {
                index,
                gene,
                alphabet_size: self.genes.alphabet_size,
            });
        }

        let rate = self.algorithm.elite_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(EvolutionConfigError::InvalidEliteRate(rate));
        }

        let rate = self.algorithm.mutation_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(EvolutionConfigError::InvalidMutationRate(rate));
        }

        if self.algorithm.tournament_size == 0 {
            return Err(EvolutionConfigError::InvalidTournamentSize);
        }

        Ok(())
    }
}
