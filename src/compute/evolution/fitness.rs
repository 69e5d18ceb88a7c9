//! Fitness function implementations for evolutionary search.
//!
//! Provides the pluggable scoring interface the engine calls for every
//! member, plus the built-in Hamming similarity score.

use crate::schema::Gene;

/// Scores a gene sequence against a target.
///
/// Implementations must be pure: the same genes and target always produce
/// the same score. Higher is better; the engine stops once a member reaches
/// [`perfect_score`](FitnessFunction::perfect_score).
pub trait FitnessFunction: Send + Sync {
    /// Score `genes` against `target`.
    fn evaluate(&self, genes: &[Gene], target: &[Gene]) -> Result<usize, FitnessError>;

    /// Highest score attainable for `target`.
    fn perfect_score(&self, target: &[Gene]) -> usize {
        target.len()
    }
}

/// Count of positions where the genes match the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingSimilarity;

impl FitnessFunction for HammingSimilarity {
    fn evaluate(&self, genes: &[Gene], target: &[Gene]) -> Result<usize, FitnessError> {
        hamming_similarity(genes, target)
    }
}

/// Closures score through the same length check as the built-in metric.
impl<F> FitnessFunction for F
where
    F: Fn(&[Gene], &[Gene]) -> usize + Send + Sync,
{
    fn evaluate(&self, genes: &[Gene], target: &[Gene]) -> Result<usize, FitnessError> {
        check_length(genes, target)?;
        Ok(self(genes, target))
    }
}

/// Number of indices `i` with `genes[i] == target[i]`.
pub fn hamming_similarity(genes: &[Gene], target: &[Gene]) -> Result<usize, FitnessError> {
    check_length(genes, target)?;
    Ok(genes.iter().zip(target).filter(|(g, t)| g == t).count())
}

fn check_length(genes: &[Gene], target: &[Gene]) -> Result<(), FitnessError> {
    if genes.len() != target.len() {
        return Err(FitnessError::LengthMismatch {
            expected: target.len(),
            actual: genes.len(),
        });
    }
    Ok(())
}

/// Fitness evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitnessError {
    #[error("Solution has {actual} genes but target has {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}
