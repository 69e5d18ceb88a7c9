//! Generation engine driving the genetic search.

use std::mem;
use std::time::Instant;

use log::{debug, info};
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::schema::{
    EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionPhase, EvolutionProgress,
    EvolutionResult, EvolutionStats, Gene, MemberSnapshot, StopReason,
};

use super::fitness::{FitnessError, FitnessFunction, HammingSimilarity};
use super::genome::{GenomeRng, Member, genome_distance};
use super::selection::{rank, tournament_index};

/// Errors surfaced by a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] EvolutionConfigError),
    #[error("Fitness evaluation failed: {0}")]
    Fitness(#[from] FitnessError),
    #[error("Population must be ranked before reproduction (phase {0:?})")]
    NotRanked(EvolutionPhase),
    #[error("Search already terminated")]
    Terminated,
}

/// Evolution engine that runs the search.
///
/// Owns two population buffers: `current` is evaluated and ranked, `next`
/// is rebuilt from it, then the two are swapped.
pub struct EvolutionEngine<F = HammingSimilarity> {
    config: EvolutionConfig,
    fitness: F,
    rng: GenomeRng,
    seed: u64,
    perfect_score: usize,
    elite_count: usize,
    current: Vec<Member>,
    next: Vec<Member>,
    history: EvolutionHistory,
    generation: usize,
    phase: EvolutionPhase,
    best: Option<(MemberSnapshot, usize)>,
    stagnation_count: usize,
    evaluations: u64,
}

impl EvolutionEngine<HammingSimilarity> {
    /// Create an engine scoring by Hamming similarity to the target.
    pub fn hamming(config: EvolutionConfig) -> Result<Self, EvolutionConfigError> {
        Self::new(config, HammingSimilarity)
    }
}

impl<F: FitnessFunction> EvolutionEngine<F> {
    /// Create a new evolution engine with an initialized population.
    pub fn new(config: EvolutionConfig, fitness: F) -> Result<Self, EvolutionConfigError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let perfect_score = fitness.perfect_score(&config.target);
        let elite_count = config.elite_count();

        let mut engine = Self {
            rng: GenomeRng::new(seed),
            seed,
            perfect_score,
            elite_count,
            current: Vec::with_capacity(config.population.size),
            next: Vec::with_capacity(config.population.size),
            config,
            fitness,
            history: EvolutionHistory::default(),
            generation: 0,
            phase: EvolutionPhase::Initialized,
            best: None,
            stagnation_count: 0,
            evaluations: 0,
        };
        engine.initialize();
        Ok(engine)
    }

    /// Reset to generation 0 with freshly randomized buffers.
    ///
    /// The generator is reseeded, so repeated calls yield the same population.
    pub fn initialize(&mut self) {
        self.rng = GenomeRng::new(self.seed);
        self.current.clear();
        self.next.clear();

        for _ in 0..self.config.population.size {
            let member = self.rng.random_member(&self.config.genes);
            self.current.push(member);
        }
        for _ in 0..self.config.population.size {
            let member = self.rng.random_member(&self.config.genes);
            self.next.push(member);
        }

        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.phase = EvolutionPhase::Initialized;
        self.best = None;
        self.stagnation_count = 0;
        self.evaluations = 0;
    }

    /// Overwrite the first members of the current population with known
    /// solutions. Extra solutions beyond the population size are ignored.
    ///
    /// Nothing is written unless every solution is valid.
    pub fn inject<I>(&mut self, solutions: I) -> Result<(), EvolutionConfigError>
    where
        I: IntoIterator<Item = Vec<Gene>>,
    {
        let solutions: Vec<Vec<Gene>> = solutions.into_iter().take(self.current.len()).collect();
        for genes in &solutions {
            self.check_solution(genes)?;
        }

        for (slot, genes) in self.current.iter_mut().zip(solutions) {
            *slot = Member::new(genes);
        }
        Ok(())
    }

    fn check_solution(&self, genes: &[Gene]) -> Result<(), EvolutionConfigError> {
        if genes.len() != self.config.genes.length {
            return Err(EvolutionConfigError::LengthMismatch {
                expected: self.config.genes.length,
                actual: genes.len(),
            });
        }
        if let Some((index, &gene)) = genes
            .iter()
            .enumerate()
            .find(|(_, g)| !self.config.genes.contains(**g))
        {
            return Err(EvolutionConfigError::GeneOutOfAlphabet {
                index,
                gene,
                alphabet_size: self.config.genes.alphabet_size,
            });
        }
        Ok(())
    }

    /// Evaluate all members in the current population.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_population(&mut self) -> Result<(), FitnessError> {
        let fitness = &self.fitness;
        let target = &self.config.target;

        // Parallel evaluation
        self.current
            .par_iter_mut()
            .try_for_each(|member| member.evaluate(fitness, target).map(|_| ()))
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_population(&mut self) -> Result<(), FitnessError> {
        let fitness = &self.fitness;
        let target = &self.config.target;

        // Sequential evaluation for WASM
        for member in &mut self.current {
            member.evaluate(fitness, target)?;
        }
        Ok(())
    }

    /// Evaluate and rank the current population, then record statistics.
    pub fn evaluate_and_rank(&mut self) -> Result<(), FitnessError> {
        self.phase = EvolutionPhase::Evaluating;
        self.evaluate_population()?;
        self.evaluations += self.current.len() as u64;

        rank(&mut self.current);
        self.phase = EvolutionPhase::Ranked;

        self.record_generation();
        Ok(())
    }

    /// Track best-ever member, stagnation and history for the ranked population.
    fn record_generation(&mut self) {
        let Some(gen_best) = self.current.last() else {
            return;
        };
        let gen_best_fitness = gen_best.fitness().unwrap_or(0);

        let improved = self
            .best
            .as_ref()
            .is_none_or(|(best, _)| gen_best_fitness > best.fitness);
        if improved {
            self.best = Some((gen_best.to_snapshot(), self.generation));
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }

        let avg_fitness = self.average_fitness();
        let diversity = self
            .current
            .iter()
            .map(|m| genome_distance(m, gen_best))
            .sum::<usize>() as f64
            / self.current.len() as f64;

        self.history.best_fitness.push(gen_best_fitness);
        self.history.avg_fitness.push(avg_fitness);
        self.history.diversity.push(diversity);

        debug!(
            "Generation {}: best={} avg={:.2} diversity={:.2}",
            self.generation, gen_best_fitness, avg_fitness, diversity
        );
    }

    /// Build the next population from the ranked current one and swap buffers.
    ///
    /// The top elites are copied unchanged into the front of the new
    /// population; the rest is filled with crossover children of tournament
    /// winners and then mutated. Fails unless the current population has
    /// just been ranked.
    pub fn reproduce(&mut self) -> Result<(), EvolutionError> {
        if self.phase != EvolutionPhase::Ranked {
            return Err(EvolutionError::NotRanked(self.phase));
        }
        self.phase = EvolutionPhase::Reproducing;

        let Self {
            config,
            rng,
            current,
            next,
            elite_count,
            ..
        } = self;
        let elites = *elite_count;
        let parents: &[Member] = current;
        let size = parents.len();

        // Elitism: keep best individuals
        for (slot, elite) in next[..elites].iter_mut().zip(&parents[size - elites..]) {
            slot.copy_from(elite);
        }

        // Fill rest with offspring
        let tournament_size = config.algorithm.tournament_size;
        for pair in next[elites..].chunks_mut(2) {
            let parent1 = &parents[tournament_index(rng, parents, tournament_size)].genes;
            let parent2 = &parents[tournament_index(rng, parents, tournament_size)].genes;

            match pair {
                [child1, child2] => rng.crossover_into(parent1, parent2, child1, Some(child2)),
                [child1] => rng.crossover_into(parent1, parent2, child1, None),
                _ => unreachable!("chunks of two are never empty"),
            };
        }

        rng.mutate_population(
            &mut next[elites..],
            config.algorithm.mutation_rate,
            config.genes.alphabet_size,
        );

        mem::swap(current, next);
        self.generation += 1;
        Ok(())
    }

    /// Check if evolution should stop. Only meaningful once ranked.
    fn should_stop(&self) -> Option<StopReason> {
        if self.best_fitness() >= self.perfect_score {
            return Some(StopReason::TargetReached);
        }

        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run one generation: evaluate, rank, and reproduce unless a stopping
    /// condition holds. Fails once the search has terminated; call
    /// [`initialize`](Self::initialize) to start over.
    pub fn advance(&mut self) -> Result<Option<StopReason>, EvolutionError> {
        if self.phase == EvolutionPhase::Terminated {
            return Err(EvolutionError::Terminated);
        }
        self.evaluate_and_rank()?;
        if let Some(reason) = self.should_stop() {
            self.phase = EvolutionPhase::Terminated;
            return Ok(Some(reason));
        }
        self.reproduce()?;
        Ok(None)
    }

    /// Fitness of the best member of the current ranked population.
    fn best_fitness(&self) -> usize {
        self.current
            .last()
            .and_then(Member::fitness)
            .unwrap_or(0)
    }

    fn average_fitness(&self) -> f64 {
        if self.current.is_empty() {
            return 0.0;
        }
        self.current
            .iter()
            .map(|m| m.fitness().unwrap_or(0))
            .sum::<usize>() as f64
            / self.current.len() as f64
    }

    /// Integer percentage of the perfect score.
    fn percent(&self, fitness: usize) -> usize {
        if self.perfect_score == 0 {
            return 100;
        }
        fitness * 100 / self.perfect_score
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        let best = self.current.last().map(Member::to_snapshot);
        let fitness_percent = self.percent(best.as_ref().map_or(0, |b| b.fitness));

        EvolutionProgress {
            generation: self.generation,
            max_generations: self.config.population.max_generations,
            best,
            fitness_percent,
            avg_fitness: self.average_fitness(),
            stagnation_count: self.stagnation_count,
            phase: self.phase,
        }
    }

    /// Run evolution with progress callback.
    ///
    /// The callback sees the ranked population every `report_interval`
    /// generations and once more at termination. A terminated engine is
    /// reinitialized first, so repeated runs start from the same population.
    pub fn run_with_callback<C>(&mut self, mut callback: C) -> Result<EvolutionResult, EvolutionError>
    where
        C: FnMut(&EvolutionProgress),
    {
        if self.phase == EvolutionPhase::Terminated {
            debug!("Restarting terminated search from generation 0");
            self.initialize();
        }

        let start_time = Instant::now();
        let interval = self.config.report_interval.max(1);

        info!(
            "Starting search: population={} elites={} length={} seed={}",
            self.current.len(),
            self.elite_count,
            self.config.genes.length,
            self.seed
        );

        let stop_reason = loop {
            self.evaluate_and_rank()?;

            let stop = self.should_stop();
            if stop.is_some() {
                self.phase = EvolutionPhase::Terminated;
            }
            if stop.is_some() || self.generation % interval == 0 {
                callback(&self.progress());
            }
            if let Some(reason) = stop {
                break reason;
            }

            self.reproduce()?;
        };

        let elapsed = start_time.elapsed().as_secs_f64();

        let (best, best_generation) = self
            .best
            .clone()
            .unwrap_or_else(|| (MemberSnapshot::default(), self.generation));

        info!(
            "Search stopped ({:?}) at generation {}: best fitness {}/{}",
            stop_reason, self.generation, best.fitness, self.perfect_score
        );

        Ok(EvolutionResult {
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                best_fitness: best.fitness,
                fitness_percent: self.percent(best.fitness),
                final_avg_fitness: self.average_fitness(),
                elapsed_seconds: elapsed,
                seed: self.seed,
                stop_reason,
            },
            best,
            best_generation,
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }

    /// The current population. Ranked ascending after evaluation.
    pub fn population(&self) -> &[Member] {
        &self.current
    }

    /// Best member seen so far and the generation it appeared in.
    pub fn best(&self) -> Option<(&MemberSnapshot, usize)> {
        self.best.as_ref().map(|(m, g)| (m, *g))
    }

    /// Current generation counter.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current phase of the generation state machine.
    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    /// Number of members carried over unchanged each generation.
    pub fn elite_count(&self) -> usize {
        self.elite_count
    }

    /// Seed the generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Engine configuration.
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GeneticAlgorithmConfig, PopulationConfig, default_target};

    fn small_config(size: usize, max_generations: usize) -> EvolutionConfig {
        EvolutionConfig {
            population: PopulationConfig {
                size,
                max_generations,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_evolution_engine_creation() {
        let engine = EvolutionEngine::hamming(small_config(10, 5)).unwrap();

        assert_eq!(engine.population().len(), 10);
        assert_eq!(engine.elite_count(), 1);
        assert_eq!(engine.phase(), EvolutionPhase::Initialized);
        assert!(engine.population().iter().all(|m| m.fitness().is_none()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config(10, 5);
        config.target.pop();
        assert!(matches!(
            EvolutionEngine::hamming(config),
            Err(EvolutionConfigError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_evolution_reaches_target() {
        let mut config = small_config(256, 1648);
        config.algorithm.mutation_rate = 0.02;

        let mut engine = EvolutionEngine::hamming(config).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.stop_reason, StopReason::TargetReached);
        assert_eq!(result.best.fitness, 20);
        assert_eq!(result.best.genes, default_target());
        assert_eq!(result.stats.fitness_percent, 100);
        assert!(result.stats.generations <= 1648);
        assert_eq!(result.best_generation, result.stats.generations);
    }

    #[test]
    fn test_injected_solution_terminates_immediately() {
        let mut engine = EvolutionEngine::hamming(small_config(32, 100)).unwrap();
        engine.inject([default_target()]).unwrap();

        let result = engine.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::TargetReached);
        assert_eq!(result.stats.generations, 0);
        assert_eq!(result.best.genes, default_target());
        assert_eq!(result.stats.total_evaluations, 32);
    }

    #[test]
    fn test_inject_rejects_bad_solutions() {
        let mut engine = EvolutionEngine::hamming(small_config(4, 1)).unwrap();
        assert!(matches!(
            engine.inject([vec![0; 3]]),
            Err(EvolutionConfigError::LengthMismatch { .. })
        ));
        assert!(matches!(
            engine.inject([vec![99; 20]]),
            Err(EvolutionConfigError::GeneOutOfAlphabet { index: 0, .. })
        ));
    }

    #[test]
    fn test_max_generations() {
        let mut config = small_config(16, 3);
        config.algorithm.mutation_rate = 0.0;
        config.algorithm.elite_rate = 1.0;

        let mut engine = EvolutionEngine::hamming(config).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.stats.generations, 3);
        assert_eq!(result.stats.total_evaluations, 4 * 16);
        assert_eq!(result.history.best_fitness.len(), 4);
        assert_eq!(engine.phase(), EvolutionPhase::Terminated);
    }

    #[test]
    fn test_zero_generations_evaluates_once() {
        let mut engine = EvolutionEngine::hamming(small_config(8, 0)).unwrap();
        let result = engine.run().unwrap();
        assert_eq!(result.stats.generations, 0);
        assert_eq!(result.stats.total_evaluations, 8);
    }

    #[test]
    fn test_elites_survive_unchanged() {
        let mut engine = EvolutionEngine::hamming(small_config(100, 10)).unwrap();
        let elites = engine.elite_count();
        assert_eq!(elites, 10);

        for _ in 0..5 {
            engine.evaluate_and_rank().unwrap();
            let top = engine.population()[100 - elites..].to_vec();

            engine.reproduce().unwrap();
            assert_eq!(&engine.population()[..elites], top.as_slice());
            assert_eq!(engine.population().len(), 100);
        }
    }

    #[test]
    fn test_best_never_regresses_with_elitism() {
        let mut engine = EvolutionEngine::hamming(small_config(64, 30)).unwrap();
        let result = engine.run().unwrap();

        assert!(
            result
                .history
                .best_fitness
                .windows(2)
                .all(|w| w[0] <= w[1])
        );
    }

    #[test]
    fn test_frozen_population_without_exploration() {
        let mut config = small_config(16, 6);
        config.algorithm = GeneticAlgorithmConfig {
            elite_rate: 1.0,
            mutation_rate: 0.0,
            ..Default::default()
        };

        let mut engine = EvolutionEngine::hamming(config).unwrap();
        let mut initial: Vec<Vec<Gene>> =
            engine.population().iter().map(|m| m.genes.clone()).collect();
        initial.sort();

        engine.run().unwrap();

        let mut after: Vec<Vec<Gene>> =
            engine.population().iter().map(|m| m.genes.clone()).collect();
        after.sort();
        assert_eq!(initial, after);
    }

    #[test]
    fn test_odd_offspring_slots() {
        // 10 members, 1 elite: nine offspring slots, the last filled singly
        let mut engine = EvolutionEngine::hamming(small_config(10, 4)).unwrap();
        for _ in 0..4 {
            engine.advance().unwrap();
            assert_eq!(engine.population().len(), 10);
            assert!(engine.population().iter().all(|m| m.genes.len() == 20));
        }
    }

    #[test]
    fn test_stagnation_limit() {
        let mut config = small_config(16, 100);
        config.population.stagnation_limit = Some(3);
        config.algorithm.elite_rate = 1.0;
        config.algorithm.mutation_rate = 0.0;

        let mut engine = EvolutionEngine::hamming(config).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.stop_reason, StopReason::Stagnation);
        assert_eq!(result.stats.generations, 3);
        assert_eq!(result.best_generation, 0);
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let run = || {
            let mut engine = EvolutionEngine::hamming(small_config(64, 20)).unwrap();
            engine.run().unwrap()
        };
        let a = run();
        let b = run();

        assert_eq!(a.best, b.best);
        assert_eq!(a.history.best_fitness, b.history.best_fitness);
        assert_eq!(a.history.avg_fitness, b.history.avg_fitness);
    }

    #[test]
    fn test_initialize_resets() {
        let mut engine = EvolutionEngine::hamming(small_config(8, 10)).unwrap();
        let initial = engine.population().to_vec();

        engine.advance().unwrap();
        engine.advance().unwrap();
        assert_eq!(engine.generation(), 2);

        engine.initialize();
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.population(), initial.as_slice());
        assert!(engine.best().is_none());
    }

    #[test]
    fn test_progress_reporting_interval() {
        let mut config = small_config(16, 9);
        config.report_interval = 3;
        config.algorithm.elite_rate = 1.0;
        config.algorithm.mutation_rate = 0.0;

        let mut engine = EvolutionEngine::hamming(config).unwrap();
        let mut seen = Vec::new();
        engine
            .run_with_callback(|progress| {
                assert!(progress.fitness_percent <= 100);
                seen.push((progress.generation, progress.phase));
            })
            .unwrap();

        let generations: Vec<usize> = seen.iter().map(|(g, _)| *g).collect();
        assert_eq!(generations, vec![0, 3, 6, 9]);
        assert_eq!(seen.last().unwrap().1, EvolutionPhase::Terminated);
    }

    #[test]
    fn test_custom_fitness() {
        // Score counts genes equal to zero; perfect score is the target length
        let zeros = |genes: &[Gene], _: &[Gene]| genes.iter().filter(|&&g| g == 0).count();
        let mut config = small_config(128, 500);
        config.algorithm.mutation_rate = 0.02;

        let mut engine = EvolutionEngine::new(config, zeros).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.stop_reason, StopReason::TargetReached);
        assert!(result.best.genes.iter().all(|&g| g == 0));
    }

    #[test]
    fn test_inject_all_or_nothing() {
        let mut engine = EvolutionEngine::hamming(small_config(4, 1)).unwrap();
        let before = engine.population().to_vec();

        assert!(matches!(
            engine.inject([default_target(), vec![0; 3]]),
            Err(EvolutionConfigError::LengthMismatch { actual: 3, .. })
        ));
        assert_eq!(engine.population(), before.as_slice());
    }

    #[test]
    fn test_repeated_runs_restart() {
        let mut engine = EvolutionEngine::hamming(small_config(16, 3)).unwrap();
        let first = engine.run().unwrap();
        let second = engine.run().unwrap();

        assert_eq!(second.stats.generations, 3);
        assert_eq!(second.stats.total_evaluations, 4 * 16);
        assert_eq!(second.history.best_fitness.len(), 4);
        assert_eq!(second.stats.total_evaluations, first.stats.total_evaluations);
        assert_eq!(second.history.best_fitness, first.history.best_fitness);
        assert_eq!(second.best, first.best);
    }

    #[test]
    fn test_reproduce_requires_ranking() {
        let mut engine = EvolutionEngine::hamming(small_config(8, 5)).unwrap();
        let before = engine.population().to_vec();

        assert!(matches!(
            engine.reproduce(),
            Err(EvolutionError::NotRanked(EvolutionPhase::Initialized))
        ));
        assert_eq!(engine.population(), before.as_slice());
        assert_eq!(engine.generation(), 0);

        engine.evaluate_and_rank().unwrap();
        engine.reproduce().unwrap();
        assert!(matches!(
            engine.reproduce(),
            Err(EvolutionError::NotRanked(EvolutionPhase::Reproducing))
        ));
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_advance_after_termination_fails() {
        let mut engine = EvolutionEngine::hamming(small_config(8, 0)).unwrap();
        assert_eq!(engine.advance().unwrap(), Some(StopReason::MaxGenerations));
        assert!(matches!(engine.advance(), Err(EvolutionError::Terminated)));
        assert_eq!(engine.progress().phase, EvolutionPhase::Terminated);
    }

    struct Failing;

    impl FitnessFunction for Failing {
        fn evaluate(&self, genes: &[Gene], _target: &[Gene]) -> Result<usize, FitnessError> {
            Err(FitnessError::LengthMismatch {
                expected: 0,
                actual: genes.len(),
            })
        }
    }

    #[test]
    fn test_fitness_error_reaches_caller() {
        let mut engine = EvolutionEngine::new(small_config(8, 5), Failing).unwrap();

        assert!(matches!(
            engine.run(),
            Err(EvolutionError::Fitness(FitnessError::LengthMismatch {
                expected: 0,
                actual: 20
            }))
        ));
        assert!(engine.best().is_none());
    }
}
