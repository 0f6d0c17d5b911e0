use std::fmt::Display;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::candidate::Candidate;
use crate::error::{PopulationError, Result};
use crate::nsga2::SurvivalStrategy;
use crate::population::{Admission, Population, Registration};

// Produces new heuristics. In a full system this wraps the prompt builder
// and the language model.
pub trait Sampler<R>: Send + Sync {
    /// A candidate drawn without a parent, used while the population has no
    /// valid member to breed from.
    fn seed(&self) -> R;

    fn sample(&self, parent: &Candidate<R>) -> R;
}

// Scores a heuristic on the task. `None` means evaluation failed.
pub trait Evaluator<R>: Send + Sync {
    fn evaluate(&self, representation: &R) -> Option<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Concurrent sample/evaluate/register workers.
    pub num_workers: usize,
    /// Total candidates to draw before the run stops.
    pub max_samples: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            max_samples: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub samples: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub unscored: usize,
    pub malformed: usize,
    pub discarded: usize,
    pub generations_advanced: usize,
    pub survival_failures: usize,
    pub final_generation: u64,
}

impl RunSummary {
    fn record(&mut self, registration: &Registration) {
        self.samples += 1;
        match registration.admission {
            Admission::Accepted => self.accepted += 1,
            Admission::Duplicate => self.duplicates += 1,
            Admission::Unscored => self.unscored += 1,
            Admission::Malformed(_) => self.malformed += 1,
            Admission::Discarded => self.discarded += 1,
        }
        match registration.survival {
            Some(Ok(_)) => self.generations_advanced += 1,
            Some(Err(_)) => self.survival_failures += 1,
            None => {}
        }
    }
}

/// Runs the select-parent, sample, evaluate, register loop on a worker pool.
/// Evaluation happens outside the population lock.
#[derive(Debug)]
pub struct EvolutionDriver {
    config: DriverConfig,
    pool: rayon::ThreadPool,
}

impl EvolutionDriver {
    pub fn new(config: DriverConfig) -> Result<Self> {
        if config.num_workers == 0 {
            return Err(PopulationError::InvalidConfig(
                "driver needs at least one worker".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_workers)
            .thread_name(|i| format!("evolution-worker-{i}"))
            .build()
            .map_err(|e| PopulationError::InvalidConfig(e.to_string()))?;

        Ok(Self { config, pool })
    }

    pub fn run<R, S, Sa, E>(
        &self,
        population: &Population<R, S>,
        sampler: &Sa,
        evaluator: &E,
    ) -> RunSummary
    where
        R: Display + Clone + Send + Sync,
        S: SurvivalStrategy,
        Sa: Sampler<R>,
        E: Evaluator<R>,
    {
        info!(
            workers = self.config.num_workers,
            max_samples = self.config.max_samples,
            capacity = population.capacity(),
            "starting run"
        );

        let registrations: Vec<Registration> = self.pool.install(|| {
            (0..self.config.max_samples)
                .into_par_iter()
                .map(|_| step(population, sampler, evaluator))
                .collect()
        });

        let mut summary = registrations
            .iter()
            .fold(RunSummary::default(), |mut summary, r| {
                summary.record(r);
                summary
            });
        summary.final_generation = population.generation();

        info!(
            samples = summary.samples,
            generation = summary.final_generation,
            "run finished"
        );

        summary
    }
}

fn step<R, S, Sa, E>(population: &Population<R, S>, sampler: &Sa, evaluator: &E) -> Registration
where
    R: Display + Clone,
    S: SurvivalStrategy,
    Sa: Sampler<R>,
    E: Evaluator<R>,
{
    let representation = match population.select_parent() {
        Ok(parent) => sampler.sample(&parent),
        Err(e) => {
            debug!(error = %e, "no parent available, seeding");
            sampler.seed()
        }
    };

    let score = evaluator.evaluate(&representation);
    population.register(Candidate::new(representation, score))
}
