use std::cmp::Ordering;

use crate::dominance_ord::DominanceOrd;

type SolutionIdx = usize;

/// One Pareto front of a non-dominated sort. Holds the bookkeeping needed to
/// peel the next front off lazily.
#[derive(Debug, Clone)]
pub struct Front<'s, S: 's> {
    dominated_solutions: Vec<Vec<SolutionIdx>>,
    domination_count: Vec<usize>,
    previous_front: Vec<SolutionIdx>,
    current_front: Vec<SolutionIdx>,
    rank: usize,
    solutions: &'s [S],
}

impl<'s, S: 's> Front<'s, S> {
    pub fn next_front(self) -> Self {
        let Front {
            dominated_solutions,
            mut domination_count,
            previous_front,
            current_front,
            rank,
            solutions,
        } = self;

        // reuse the previous_front
        let mut next_front = previous_front;
        next_front.clear();

        for &p_i in current_front.iter() {
            for &q_i in dominated_solutions[p_i].iter() {
                debug_assert!(domination_count[q_i] > 0);
                domination_count[q_i] -= 1;
                if domination_count[q_i] == 0 {
                    // q_i is not dominated by any other solution. it belongs to the next front.
                    next_front.push(q_i);
                }
            }
        }

        // keep members in pool order so truncation ties stay reproducible
        next_front.sort_unstable();

        Self {
            dominated_solutions,
            domination_count,
            previous_front: current_front,
            current_front: next_front,
            rank: rank + 1,
            solutions,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Indices into the sorted slice, ascending.
    pub fn indices(&self) -> &[SolutionIdx] {
        &self.current_front
    }

    pub fn len(&self) -> usize {
        self.current_front.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current_front.is_empty()
    }

    pub fn iter(&self) -> FrontElemIter<'_, 's, S> {
        FrontElemIter {
            front: self,
            next_idx: 0,
        }
    }
}

pub struct FrontElemIter<'f, 's: 'f, S: 's> {
    front: &'f Front<'s, S>,
    next_idx: usize,
}

impl<'f, 's: 'f, S: 's> Iterator for FrontElemIter<'f, 's, S> {
    type Item = (&'s S, SolutionIdx);

    fn next(&mut self) -> Option<Self::Item> {
        match self.front.current_front.get(self.next_idx) {
            Some(&solution_idx) => {
                self.next_idx += 1;
                Some((&self.front.solutions[solution_idx], solution_idx))
            }
            None => None,
        }
    }
}

/// Perform a non-dominated sort of `solutions`. Returns the first
/// Pareto front.
pub fn non_dominated_sort<'s, S, D>(solutions: &'s [S], domination: &D) -> Front<'s, S>
where
    D: DominanceOrd,
    S: AsRef<D::T>,
{
    let mut dominated_solutions: Vec<Vec<SolutionIdx>> =
        solutions.iter().map(|_| Vec::new()).collect();

    let mut domination_count: Vec<usize> = vec![0; solutions.len()];
    let mut current_front: Vec<SolutionIdx> = Vec::new();

    let mut iter = solutions.iter().enumerate();
    while let Some((p_i, p)) = iter.next() {
        let pair_iter = iter.clone();
        for (q_i, q) in pair_iter {
            match domination.dominance_ord(p.as_ref(), q.as_ref()) {
                Ordering::Less => {
                    // p dominates q
                    dominated_solutions[p_i].push(q_i);
                    domination_count[q_i] += 1;
                }
                Ordering::Greater => {
                    // q dominates p
                    dominated_solutions[q_i].push(p_i);
                    domination_count[p_i] += 1;
                }
                Ordering::Equal => {}
            }
        }
        // every q > p has been compared against p, so the count is final.
        if domination_count[p_i] == 0 {
            current_front.push(p_i);
        }
    }

    Front {
        dominated_solutions,
        domination_count,
        previous_front: Vec::new(),
        current_front,
        rank: 0,
        solutions,
    }
}

/// Crowding distance of every member of `front`, in the order of
/// `front.indices()`.
///
/// For each objective the front is sorted, the two extremes get an infinite
/// distance and every interior point adds the normalised gap between its
/// neighbours. Objectives without spread contribute nothing. Rows with a
/// non-finite component have no position in objective space and get `0.0`.
pub fn crowding_distance<S>(front: &Front<'_, S>) -> Vec<f64>
where
    S: AsRef<[f64]>,
{
    let rows: Vec<&[f64]> = front.iter().map(|(s, _)| s.as_ref()).collect();
    let n = rows.len();
    let mut distances = vec![0.0; n];

    if n <= 2 {
        distances.iter_mut().for_each(|d| *d = f64::INFINITY);
    } else {
        let n_objectives = rows[0].len();

        for m in 0..n_objectives {
            // stable, so equal values keep pool order
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| rows[a][m].total_cmp(&rows[b][m]));

            let first = order[0];
            let last = order[n - 1];

            // a flat objective has no extremes; it must not mark boundaries
            let spread = rows[last][m] - rows[first][m];
            if !(spread.is_finite() && spread > 0.0) {
                continue;
            }

            distances[first] = f64::INFINITY;
            distances[last] = f64::INFINITY;

            let norm = 1.0 / (spread * n_objectives as f64);
            for w in order.windows(3) {
                let gap = rows[w[2]][m] - rows[w[0]][m];
                distances[w[1]] += gap.abs() * norm;
            }
        }
    }

    for (d, row) in distances.iter_mut().zip(rows.iter()) {
        if row.iter().any(|v| !v.is_finite()) {
            *d = 0.0;
        }
    }

    distances
}
