//! Configuration types for the solution space searched by the engine.

use serde::{Deserialize, Serialize};

/// A single gene value. Legal values lie in `[0, alphabet_size)`.
pub type Gene = u32;

/// Shape of a candidate solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneConfig {
    /// Number of genes in every solution (`L`).
    #[serde(default = "default_length")]
    pub length: usize,
    /// Size of the gene alphabet. Genes are drawn from `[0, alphabet_size)`.
    #[serde(default = "default_alphabet_size")]
    pub alphabet_size: Gene,
}

impl Default for GeneConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            alphabet_size: default_alphabet_size(),
        }
    }
}

fn default_length() -> usize {
    20
}
fn default_alphabet_size() -> Gene {
    10
}

/// The reference solution used by the built-in configuration:
/// the digits 0-9 repeated twice.
pub fn default_target() -> Vec<Gene> {
    (0..20).map(|i| i % 10).collect()
}

impl GeneConfig {
    /// Check if a gene value belongs to the alphabet.
    #[inline]
    pub fn contains(&self, gene: Gene) -> bool {
        gene < self.alphabet_size
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if self.alphabet_size == 0 {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(())
    }
}

/// Gene configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Solution length must be non-zero")]
    ZeroLength,
    #[error("Gene alphabet must contain at least one value")]
    EmptyAlphabet,
}
