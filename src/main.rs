//! Cifer GA CLI - Run a genetic search from the built-in or a JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::time::Instant;

use cifer_ga::{
    EvolutionConfig, EvolutionEngine, StopReason,
    schema::{EvolutionProgress, Gene},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 || args.get(1).is_some_and(|a| a == "--help") {
        eprintln!("Usage: {} [config.json | --example]", args[0]);
        eprintln!();
        eprintln!("Evolve a population toward the configured target.");
        eprintln!("Without arguments the built-in configuration is used.");
        std::process::exit(1);
    }

    if args.get(1).is_some_and(|a| a == "--example") {
        print_example_config();
        return;
    }

    // Load configuration
    let config = match args.get(1) {
        Some(path) => EvolutionConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => EvolutionConfig::default(),
    };

    let mut engine = EvolutionEngine::hamming(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    println!("Cifer GA");
    println!("========");
    println!(
        "Population: {} ({} elites), max generations: {}",
        engine.config().population.size,
        engine.elite_count(),
        engine.config().population.max_generations
    );
    println!("Seed: {}", engine.seed());
    println!();

    let start = Instant::now();
    let result = engine.run_with_callback(print_best).unwrap_or_else(|e| {
        eprintln!("Search failed: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!();
    match result.stats.stop_reason {
        StopReason::TargetReached => println!(
            "Solved at generation {}: {}",
            result.best_generation,
            format_genes(&result.best.genes)
        ),
        reason => println!(
            "Stopped ({:?}) after {} generations, best {}% at generation {}: {}",
            reason,
            result.stats.generations,
            result.stats.fitness_percent,
            result.best_generation,
            format_genes(&result.best.genes)
        ),
    }
    println!(
        "Time: {:.2}s ({} evaluations)",
        elapsed.as_secs_f32(),
        result.stats.total_evaluations
    );
}

fn print_best(progress: &EvolutionProgress) {
    if let Some(best) = &progress.best {
        println!(
            "At gen {}, best:{}  ({}%)",
            progress.generation,
            format_genes(&best.genes),
            progress.fitness_percent
        );
    }
}

fn format_genes(genes: &[Gene]) -> String {
    genes
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
