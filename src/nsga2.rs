use std::fmt::Debug;

use crate::dominance_ord::Minimization;
use crate::error::{PopulationError, Result};
use crate::non_dominated_sort::{crowding_distance, non_dominated_sort};

/// A pool member kept by a survival step, with the rank and crowding distance
/// it was kept under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Survivor {
    pub index: usize,
    pub rank: usize,
    pub crowding: f64,
}

/// Picks the next population out of a pool of objective rows.
///
/// Rows are on the minimisation scale and all have the same length. An
/// implementation returns at most `capacity` survivors with distinct indices;
/// an error leaves the caller's population untouched.
pub trait SurvivalStrategy: Send + Sync + Debug {
    fn survive(&self, rows: &[Vec<f64>], capacity: usize) -> Result<Vec<Survivor>>;
}

/// NSGA-II truncation: fill front by front, and cut the first front that does
/// not fit by descending crowding distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nsga2Survival;

impl SurvivalStrategy for Nsga2Survival {
    fn survive(&self, rows: &[Vec<f64>], capacity: usize) -> Result<Vec<Survivor>> {
        select_and_rank(rows, capacity)
    }
}

fn select_and_rank(rows: &[Vec<f64>], n: usize) -> Result<Vec<Survivor>> {
    if rows.is_empty() {
        return Err(PopulationError::EmptyPool);
    }

    // Cannot select more solutions than we actually have
    let n = rows.len().min(n);

    let mut result = Vec::with_capacity(n);
    let mut missing_solutions = n;
    let mut front = non_dominated_sort(rows, &Minimization);

    while missing_solutions > 0 {
        if front.is_empty() {
            return Err(PopulationError::Survival(format!(
                "fronts exhausted with {missing_solutions} slots left"
            )));
        }

        let crowding = crowding_distance(&front);
        if let Some(pos) = crowding.iter().position(|d| d.is_nan()) {
            return Err(PopulationError::NonFiniteCrowding(front.indices()[pos]));
        }

        let mut assigned: Vec<Survivor> = front
            .indices()
            .iter()
            .zip(crowding)
            .map(|(&index, crowding)| Survivor {
                index,
                rank: front.rank(),
                crowding,
            })
            .collect();

        if assigned.len() > missing_solutions {
            // the front does not fit in total. keep the most isolated
            // members; the sort is stable so ties go to the lower index.
            assigned.sort_by(|a, b| b.crowding.total_cmp(&a.crowding));
        }

        let take = assigned.len().min(missing_solutions);
        result.extend(assigned.into_iter().take(take));

        missing_solutions -= take;
        if missing_solutions == 0 {
            break;
        }

        front = front.next_front();
    }

    debug_assert_eq!(n, result.len());

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Score;

    fn pool(scores: &[Score]) -> Vec<Vec<f64>> {
        scores.iter().map(|s| s.objective_row(2)).collect()
    }

    fn valid(a: f64, b: f64) -> Score {
        Score::from(vec![a, b])
    }

    #[test]
    fn first_front_is_the_non_dominated_set() {
        let rows = pool(&[valid(3.0, 1.0), valid(1.0, 3.0), valid(2.0, 2.0), valid(0.0, 0.0)]);
        let survivors = Nsga2Survival.survive(&rows, 4).unwrap();

        let mut front0: Vec<usize> = survivors
            .iter()
            .filter(|s| s.rank == 0)
            .map(|s| s.index)
            .collect();
        front0.sort_unstable();
        assert_eq!(front0, vec![0, 1, 2]);

        let dominated = survivors.iter().find(|s| s.index == 3).unwrap();
        assert_eq!(dominated.rank, 1);
    }

    #[test]
    fn dominated_candidates_are_cut_first() {
        let rows = pool(&[valid(0.0, 0.0), valid(3.0, 1.0), valid(1.0, 3.0), valid(2.0, 2.0)]);
        let survivors = Nsga2Survival.survive(&rows, 3).unwrap();
        let mut kept: Vec<usize> = survivors.iter().map(|s| s.index).collect();
        kept.sort_unstable();
        assert_eq!(kept, vec![1, 2, 3]);
    }

    #[test]
    fn overflowing_front_keeps_the_boundary() {
        // one front of four; the two interior points have equal crowding
        let rows = pool(&[valid(1.0, 3.0), valid(0.0, 4.0), valid(3.0, 1.0), valid(4.0, 0.0)]);
        let survivors = Nsga2Survival.survive(&rows, 3).unwrap();

        assert_eq!(survivors.len(), 3);
        assert_eq!(survivors[0].index, 1);
        assert_eq!(survivors[1].index, 3);
        assert!(survivors[0].crowding.is_infinite());
        // tie between indices 0 and 2 goes to the lower index
        assert_eq!(survivors[2].index, 0);
        assert!(survivors[2].crowding.is_finite());
    }

    #[test]
    fn truncation_is_reproducible() {
        let scores: Vec<Score> = (0..9)
            .map(|i| valid(i as f64, 8.0 - i as f64))
            .collect();
        let rows = pool(&scores);
        let first = Nsga2Survival.survive(&rows, 8).unwrap();
        let second = Nsga2Survival.survive(&rows, 8).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_scores_fill_last() {
        let rows = pool(&[Score::Invalid, valid(1.0, 1.0), Score::Invalid, valid(0.5, 2.0)]);
        let survivors = Nsga2Survival.survive(&rows, 3).unwrap();
        let kept: Vec<usize> = survivors.iter().map(|s| s.index).collect();
        assert_eq!(kept, vec![1, 3, 0]);
        assert_eq!(survivors[2].rank, 1);
        assert_eq!(survivors[2].crowding, 0.0);
    }

    #[test]
    fn flat_objective_does_not_protect_interior_points() {
        let rows: Vec<Vec<f64>> = [1.0, 0.0, 3.0, 4.0, 1.5]
            .iter()
            .map(|&x| vec![x, 4.0 - x, 0.0])
            .collect();
        let survivors = Nsga2Survival.survive(&rows, 3).unwrap();
        let kept: Vec<usize> = survivors.iter().map(|s| s.index).collect();
        assert_eq!(kept, vec![1, 3, 2]);
        assert!(survivors.iter().all(|s| s.rank == 0));
    }

    #[test]
    fn small_pool_survives_whole() {
        let rows = pool(&[valid(1.0, 1.0), valid(2.0, 0.0)]);
        assert_eq!(Nsga2Survival.survive(&rows, 10).unwrap().len(), 2);
    }

    #[test]
    fn empty_pool_is_an_error() {
        assert_eq!(
            Nsga2Survival.survive(&[], 4),
            Err(PopulationError::EmptyPool)
        );
    }
}
