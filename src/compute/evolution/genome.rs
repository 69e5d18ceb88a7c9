//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, crossover, and mutation operations.

use rand::prelude::*;

use crate::schema::{Gene, GeneConfig, MemberSnapshot};

use super::fitness::{FitnessError, FitnessFunction};

/// A candidate solution: a gene sequence plus its cached fitness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The solution vector.
    pub genes: Vec<Gene>,
    fitness: Option<usize>,
}

impl Member {
    /// Create a member with unknown fitness.
    pub fn new(genes: Vec<Gene>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    /// Fitness from the most recent evaluation, or `None` if the genes
    /// changed since.
    #[inline]
    pub fn fitness(&self) -> Option<usize> {
        self.fitness
    }

    /// Evaluate the genes against `target` and cache the score.
    pub fn evaluate<F: FitnessFunction + ?Sized>(
        &mut self,
        fitness: &F,
        target: &[Gene],
    ) -> Result<usize, FitnessError> {
        let score = fitness.evaluate(&self.genes, target)?;
        self.fitness = Some(score);
        Ok(score)
    }

    /// Mark the cached fitness stale.
    #[inline]
    pub fn invalidate(&mut self) {
        self.fitness = None;
    }

    /// Copy genes and fitness from another member without reallocating.
    pub fn copy_from(&mut self, other: &Member) {
        self.genes.clone_from(&other.genes);
        self.fitness = other.fitness;
    }

    /// Convert to snapshot for reporting. Unknown fitness reports as 0.
    pub fn to_snapshot(&self) -> MemberSnapshot {
        MemberSnapshot {
            genes: self.genes.clone(),
            fitness: self.fitness.unwrap_or(0),
        }
    }
}

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a member with uniformly random genes.
    pub fn random_member(&mut self, genes: &GeneConfig) -> Member {
        let solution = (0..genes.length)
            .map(|_| self.random_gene(genes.alphabet_size))
            .collect();
        Member::new(solution)
    }

    /// Uniform gene in `[0, alphabet_size)`.
    #[inline]
    fn random_gene(&mut self, alphabet_size: Gene) -> Gene {
        self.rng.gen_range(0..alphabet_size)
    }

    /// Uniform index in `[0, len)`.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Single-point crossover producing two children.
    pub fn crossover(&mut self, parent1: &Member, parent2: &Member) -> (Member, Member) {
        let mut child1 = Member::new(Vec::with_capacity(parent1.genes.len()));
        let mut child2 = Member::new(Vec::with_capacity(parent2.genes.len()));
        self.crossover_into(&parent1.genes, &parent2.genes, &mut child1, Some(&mut child2));
        (child1, child2)
    }

    /// Single-point crossover writing into existing members.
    ///
    /// `child1` receives `parent1[..cut] ++ parent2[cut..]`, `child2` (if
    /// any) the complement. Returns the cut point.
    pub fn crossover_into(
        &mut self,
        parent1: &[Gene],
        parent2: &[Gene],
        child1: &mut Member,
        child2: Option<&mut Member>,
    ) -> usize {
        debug_assert_eq!(parent1.len(), parent2.len());
        let cut = self.index(parent1.len());

        splice(&mut child1.genes, &parent1[..cut], &parent2[cut..]);
        child1.invalidate();

        if let Some(child2) = child2 {
            splice(&mut child2.genes, &parent2[..cut], &parent1[cut..]);
            child2.invalidate();
        }

        cut
    }

    /// Mutate a member: each gene is redrawn with probability `rate`.
    ///
    /// Returns the number of genes replaced.
    pub fn mutate(&mut self, member: &mut Member, rate: f64, alphabet_size: Gene) -> usize {
        let mut mutated = 0;
        for gene in &mut member.genes {
            if self.rng.gen_bool(rate) {
                *gene = self.rng.gen_range(0..alphabet_size);
                mutated += 1;
            }
        }
        if mutated > 0 {
            member.invalidate();
        }
        mutated
    }

    /// Mutate every member of a slice.
    pub fn mutate_population(
        &mut self,
        members: &mut [Member],
        rate: f64,
        alphabet_size: Gene,
    ) -> usize {
        members
            .iter_mut()
            .map(|member| self.mutate(member, rate, alphabet_size))
            .sum()
    }
}

/// Overwrite `dest` with `head ++ tail`, reusing its allocation.
fn splice(dest: &mut Vec<Gene>, head: &[Gene], tail: &[Gene]) {
    dest.clear();
    dest.extend_from_slice(head);
    dest.extend_from_slice(tail);
}

/// Hamming distance between two members.
pub fn genome_distance(m1: &Member, m2: &Member) -> usize {
    m1.genes
        .iter()
        .zip(m2.genes.iter())
        .filter(|(a, b)| a != b)
        .count()
        + m1.genes.len().abs_diff(m2.genes.len())
}
