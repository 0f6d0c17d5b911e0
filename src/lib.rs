//! Multi-objective population store for automated heuristic design.
//!
//! Evaluated candidates are registered concurrently into a [`Population`];
//! every `capacity` registrations it runs NSGA-II survival (non-dominated
//! sorting plus crowding-distance truncation) and advances a generation.
//! The sampling loop draws parents through binary tournament selection.

pub mod candidate;
pub mod demo_task;
pub mod dominance_ord;
pub mod error;
pub mod evolution;
pub mod non_dominated_sort;
pub mod nsga2;
pub mod population;

pub use candidate::{Candidate, Score};
pub use error::{PopulationError, Result};
pub use evolution::{DriverConfig, Evaluator, EvolutionDriver, RunSummary, Sampler};
pub use nsga2::{Nsga2Survival, SurvivalStrategy, Survivor};
pub use population::{Admission, Population, PopulationConfig, PopulationStats, Registration};
