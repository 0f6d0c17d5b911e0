use std::any::Any;
use std::collections::HashSet;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::candidate::{Candidate, Score};
use crate::error::{PopulationError, Result};
use crate::nsga2::{Nsga2Survival, SurvivalStrategy, Survivor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Target population size. Also the number of registrations that
    /// triggers a survival step.
    pub capacity: usize,
    /// Generation counter to start from when resuming a run.
    pub initial_generation: u64,
    /// Number of objectives every score must carry.
    pub objectives: usize,
    /// Seed for parent selection. Drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            initial_generation: 0,
            objectives: 2,
            seed: None,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PopulationError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        if self.objectives == 0 {
            return Err(PopulationError::InvalidConfig(
                "at least one objective is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a registered candidate was admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Staged with its score intact.
    Accepted,
    /// Same representation or score as a held candidate; staged as invalid.
    Duplicate,
    /// No score; staged as invalid.
    Unscored,
    /// Score failed validation; staged as invalid.
    Malformed(PopulationError),
    /// Not staged. Generation 0 only takes candidates with a valid score.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub admission: Admission,
    /// Present when this registration filled the pending buffer. `Ok` holds
    /// the generation the population advanced to.
    pub survival: Option<Result<u64>>,
}

impl Registration {
    pub fn is_staged(&self) -> bool {
        self.admission != Admission::Discarded
    }

    pub fn advanced(&self) -> bool {
        matches!(self.survival, Some(Ok(_)))
    }
}

/// Counters over the lifetime of a population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulationStats {
    pub registered: u64,
    pub discarded: u64,
    pub duplicates: u64,
    pub unscored: u64,
    pub malformed: u64,
    pub generations: u64,
    pub survival_failures: u64,
}

#[derive(Debug)]
struct Entry<R> {
    key: String,
    candidate: Candidate<R>,
}

#[derive(Debug)]
struct Inner<R> {
    members: Vec<Entry<R>>,
    pending: Vec<Entry<R>>,
    generation: u64,
    keys: HashSet<String>,
    scores: HashSet<Vec<u64>>,
    rng: StdRng,
    stats: PopulationStats,
}

impl<R> Inner<R> {
    fn is_duplicate(&self, key: &str, score: &Score) -> bool {
        self.keys.contains(key)
            || score
                .fingerprint()
                .map_or(false, |fp| self.scores.contains(&fp))
    }

    fn index(&mut self, entry: &Entry<R>) {
        self.keys.insert(entry.key.clone());
        if let Some(fp) = entry.candidate.score().fingerprint() {
            self.scores.insert(fp);
        }
    }

    fn reindex(&mut self) {
        let keys = self.members.iter().map(|e| e.key.clone()).collect();
        let scores = self
            .members
            .iter()
            .filter_map(|e| e.candidate.score().fingerprint())
            .collect();
        self.keys = keys;
        self.scores = scores;
    }
}

/// Thread-safe NSGA-II population.
///
/// Producers call [`Population::register`] from any thread; every
/// `capacity` registrations the staged candidates are merged with the current
/// members and truncated back to `capacity` by the survival strategy.
/// Readers only ever receive copies.
#[derive(Debug)]
pub struct Population<R, S = Nsga2Survival> {
    config: PopulationConfig,
    strategy: S,
    inner: Mutex<Inner<R>>,
}

impl<R> Population<R, Nsga2Survival> {
    pub fn new(config: PopulationConfig) -> Result<Self> {
        Self::with_strategy(config, Nsga2Survival)
    }
}

impl<R, S: SurvivalStrategy> Population<R, S> {
    pub fn with_strategy(config: PopulationConfig, strategy: S) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let inner = Inner {
            members: Vec::with_capacity(config.capacity),
            pending: Vec::with_capacity(config.capacity),
            generation: config.initial_generation,
            keys: HashSet::new(),
            scores: HashSet::new(),
            rng,
            stats: PopulationStats::default(),
        };

        Ok(Self {
            config,
            strategy,
            inner: Mutex::new(inner),
        })
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Number of current members, excluding staged candidates.
    pub fn len(&self) -> usize {
        self.inner.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().members.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn stats(&self) -> PopulationStats {
        self.inner.lock().stats
    }

    /// Survival step over members + pending. On error nothing is modified.
    fn advance(&self, inner: &mut Inner<R>) -> Result<u64> {
        let objectives = self.config.objectives;
        let rows: Vec<Vec<f64>> = inner
            .members
            .iter()
            .chain(inner.pending.iter())
            .map(|e| e.candidate.score().objective_row(objectives))
            .collect();

        // nothing is drained yet, so a panicking strategy leaves state intact
        let survivors = panic::catch_unwind(AssertUnwindSafe(|| {
            self.strategy.survive(&rows, self.config.capacity)
        }))
        .unwrap_or_else(|payload| Err(PopulationError::Survival(panic_message(&*payload))))
        .and_then(|survivors| check_survivors(survivors, rows.len(), self.config.capacity));

        let survivors = match survivors {
            Ok(survivors) => survivors,
            Err(e) => {
                inner.stats.survival_failures += 1;
                warn!(
                    generation = inner.generation,
                    pending = inner.pending.len(),
                    error = %e,
                    "survival step failed, keeping the current population"
                );
                return Err(e);
            }
        };

        let mut pool: Vec<Option<Entry<R>>> = inner
            .members
            .drain(..)
            .chain(inner.pending.drain(..))
            .map(Some)
            .collect();

        for survivor in survivors {
            if let Some(mut entry) = pool[survivor.index].take() {
                entry.candidate.assign(survivor.rank, survivor.crowding);
                inner.members.push(entry);
            }
        }

        inner.reindex();
        inner.generation += 1;
        inner.stats.generations += 1;

        info!(
            generation = inner.generation,
            members = inner.members.len(),
            dropped = pool.iter().filter(|e| e.is_some()).count(),
            "population advanced"
        );

        Ok(inner.generation)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("strategy panicked: {detail}")
}

/// Rejects survivor lists a caller could not commit: out-of-range or repeated
/// indices, or more survivors than slots.
fn check_survivors(survivors: Vec<Survivor>, pool: usize, capacity: usize) -> Result<Vec<Survivor>> {
    if survivors.len() > capacity {
        return Err(PopulationError::Survival(format!(
            "{} survivors for {capacity} slots",
            survivors.len()
        )));
    }

    let mut seen = vec![false; pool];
    for s in &survivors {
        match seen.get_mut(s.index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(PopulationError::Survival(format!(
                    "pool index {} selected twice",
                    s.index
                )))
            }
            None => {
                return Err(PopulationError::Survival(format!(
                    "pool index {} out of range for {pool} candidates",
                    s.index
                )))
            }
        }
        if s.crowding.is_nan() {
            return Err(PopulationError::NonFiniteCrowding(s.index));
        }
    }

    Ok(survivors)
}

impl<R: Display, S: SurvivalStrategy> Population<R, S> {
    /// Stages `candidate` and runs a survival step once `capacity` candidates
    /// are pending.
    ///
    /// Never panics on bad input: unscored, malformed and duplicate
    /// candidates are neutralised to [`Score::Invalid`] and a failed survival
    /// step is reported in the returned [`Registration`].
    pub fn register(&self, mut candidate: Candidate<R>) -> Registration {
        let key = candidate.representation().to_string();

        let admission = match candidate.score().check(self.config.objectives) {
            Ok(()) if candidate.score().is_valid() => Admission::Accepted,
            Ok(()) => Admission::Unscored,
            Err(e) => {
                warn!(candidate = %key, error = %e, "malformed score, neutralising");
                Admission::Malformed(e)
            }
        };

        let mut inner = self.inner.lock();

        if inner.generation == 0 && admission != Admission::Accepted {
            inner.stats.discarded += 1;
            if let Admission::Malformed(_) = admission {
                inner.stats.malformed += 1;
            }
            debug!(candidate = %key, "discarded during bootstrap");
            return Registration {
                admission: Admission::Discarded,
                survival: None,
            };
        }

        let admission = match admission {
            Admission::Accepted if inner.is_duplicate(&key, candidate.score()) => {
                candidate.invalidate();
                inner.stats.duplicates += 1;
                Admission::Duplicate
            }
            Admission::Unscored => {
                candidate.invalidate();
                inner.stats.unscored += 1;
                Admission::Unscored
            }
            Admission::Malformed(e) => {
                candidate.invalidate();
                inner.stats.malformed += 1;
                Admission::Malformed(e)
            }
            other => other,
        };

        let entry = Entry { key, candidate };
        inner.index(&entry);
        debug!(
            candidate = %entry.key,
            score = %entry.candidate.score(),
            admission = ?admission,
            "staged"
        );
        inner.pending.push(entry);
        inner.stats.registered += 1;

        let survival = if inner.pending.len() >= self.config.capacity {
            Some(self.advance(&mut inner))
        } else {
            None
        };

        Registration {
            admission,
            survival,
        }
    }

    /// Whether `candidate` matches a member or staged candidate by
    /// representation or by exact score.
    pub fn is_duplicate(&self, candidate: &Candidate<R>) -> bool {
        let key = candidate.representation().to_string();
        self.inner.lock().is_duplicate(&key, candidate.score())
    }
}

impl<R: Clone, S: SurvivalStrategy> Population<R, S> {
    /// Copy of the current members.
    pub fn members(&self) -> Vec<Candidate<R>> {
        self.inner
            .lock()
            .members
            .iter()
            .map(|e| e.candidate.clone())
            .collect()
    }

    /// Binary tournament over the members with a valid score.
    pub fn select_parent(&self) -> Result<Candidate<R>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let valid: Vec<&Candidate<R>> = inner
            .members
            .iter()
            .map(|e| &e.candidate)
            .filter(|c| c.score().is_valid())
            .collect();

        match valid.len() {
            0 => Err(PopulationError::NoValidCandidate),
            1 => Ok(valid[0].clone()),
            n => {
                let picks = index::sample(&mut inner.rng, n, 2);
                let winner = binary_tournament(valid[picks.index(0)], valid[picks.index(1)]);
                Ok(winner.clone())
            }
        }
    }
}

/// Lower rank wins, then higher crowding; a full tie goes to `second`.
fn binary_tournament<'a, R>(first: &'a Candidate<R>, second: &'a Candidate<R>) -> &'a Candidate<R> {
    if first.rank() != second.rank() {
        if first.rank() < second.rank() {
            first
        } else {
            second
        }
    } else if first.crowding() > second.crowding() {
        first
    } else {
        second
    }
}
