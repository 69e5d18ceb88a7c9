//! Ranking and parent selection.

use super::genome::{GenomeRng, Member};

/// Sort a population by ascending fitness, best member last.
///
/// Members with unknown fitness sort before every evaluated member.
pub fn rank(population: &mut [Member]) {
    population.sort_unstable_by_key(Member::fitness);
}

/// Tournament selection: draw `size` indices uniformly with replacement and
/// return the one with the highest fitness. Ties go to the first drawn.
///
/// `population` must be non-empty and `size` at least 1.
pub fn tournament_index(rng: &mut GenomeRng, population: &[Member], size: usize) -> usize {
    let mut best_idx = rng.index(population.len());
    for _ in 1..size {
        let idx = rng.index(population.len());
        if population[idx].fitness() > population[best_idx].fitness() {
            best_idx = idx;
        }
    }
    best_idx
}

/// Tournament selection returning a copy of the winner.
pub fn select(rng: &mut GenomeRng, population: &[Member], size: usize) -> Member {
    population[tournament_index(rng, population, size)].clone()
}
