use chrono::Local;
use colored::Colorize;
use csv::Writer;
use heuristic_population::demo_task::{GaussianSampler, Heuristic, Zdt1Task};
use heuristic_population::{
    Candidate, DriverConfig, EvolutionDriver, Population, PopulationConfig, RunSummary,
};
use itertools::Itertools;
use serde::Serialize;
use std::error::Error;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const CAPACITY: usize = 20;
const OBJECTIVES: usize = 2;
const DIMS: usize = 6;
const SIGMA: f64 = 0.08;
const FAILURE_RATE: f64 = 0.1;
const WORKERS: usize = 8;
const SAMPLES: usize = 2_000;
const SEED: u64 = 42;

#[derive(Debug, Serialize)]
pub struct MemberRecord {
    pub generation: u64,
    pub rank: usize,
    pub crowding: f64,
    pub score: String,
    pub heuristic: String,
}

fn write_members(
    members: &[Candidate<Heuristic>],
    generation: u64,
    file_path: &str,
) -> Result<(), Box<dyn Error>> {
    let mut writer = Writer::from_path(file_path)?;

    for member in members {
        writer.serialize(MemberRecord {
            generation,
            rank: member.rank(),
            crowding: member.crowding(),
            score: member.score().to_string(),
            heuristic: member.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

fn print_summary(summary: &RunSummary, members: &[Candidate<Heuristic>]) {
    println!(
        "{} - samples: {}, accepted: {}, duplicates: {}, unscored: {}, discarded: {}, survival failures: {}",
        format!("Generation {:3}", summary.final_generation).bold().red(),
        summary.samples,
        summary.accepted,
        summary.duplicates,
        summary.unscored,
        summary.discarded,
        summary.survival_failures,
    );

    let ordered = members.iter().sorted_by(|a, b| {
        a.rank()
            .cmp(&b.rank())
            .then_with(|| b.crowding().total_cmp(&a.crowding()))
    });

    for member in ordered {
        println!(
            "  rank {} crowding {:>8.4} score {} {}",
            member.rank(),
            member.crowding(),
            member.score(),
            member.to_string().dimmed(),
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let population = Population::new(PopulationConfig {
        capacity: CAPACITY,
        initial_generation: 0,
        objectives: OBJECTIVES,
        seed: Some(SEED),
    })?;
    let driver = EvolutionDriver::new(DriverConfig {
        num_workers: WORKERS,
        max_samples: SAMPLES,
    })?;
    let sampler = GaussianSampler::new(DIMS, SIGMA)?;
    let task = Zdt1Task {
        failure_rate: FAILURE_RATE,
    };

    let start = Instant::now();
    let summary = driver.run(&population, &sampler, &task);
    let elapsed = start.elapsed();

    let members = population.members();
    print_summary(&summary, &members);
    println!("Finished in {:.2?}", elapsed);

    let file_path = format!("population_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
    write_members(&members, summary.final_generation, &file_path)?;
    println!("Final population written to {}", file_path.green());

    Ok(())
}
