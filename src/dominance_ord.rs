use std::cmp::Ordering;

pub trait DominanceOrd {
    /// The type on which the dominance relation is defined.
    type T: ?Sized;

    /// Returns the dominance order.
    fn dominance_ord(&self, a: &Self::T, b: &Self::T) -> Ordering {
        if self.dominates(a, b) {
            Ordering::Less
        } else if self.dominates(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Returns true if `a` dominates `b` ("a < b").
    fn dominates(&self, a: &Self::T, b: &Self::T) -> bool {
        matches!(self.dominance_ord(a, b), Ordering::Less)
    }
}

/// Pareto dominance over objective rows where lower is better in every
/// dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minimization;

impl DominanceOrd for Minimization {
    type T = [f64];

    fn dominance_ord(&self, a: &[f64], b: &[f64]) -> Ordering {
        debug_assert_eq!(a.len(), b.len());

        let mut less_cnt = 0;
        let mut greater_cnt = 0;

        for (x, y) in a.iter().zip(b.iter()) {
            match x.partial_cmp(y) {
                Some(Ordering::Less) => less_cnt += 1,
                Some(Ordering::Greater) => greater_cnt += 1,
                _ => {}
            }
        }

        if less_cnt > 0 && greater_cnt == 0 {
            Ordering::Less
        } else if greater_cnt > 0 && less_cnt == 0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}
