use std::fmt;

use rand::{thread_rng, Rng};
use rand_distr::{Distribution, Normal, NormalError};

use crate::candidate::Candidate;
use crate::evolution::{Evaluator, Sampler};

/// Stand-in for an LLM-written heuristic: a point in the unit hypercube.
#[derive(Debug, Clone, PartialEq)]
pub struct Heuristic {
    pub params: Vec<f64>,
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p:.4}")?;
        }
        write!(f, ")")
    }
}

/// Draws uniform seeds and perturbs parents with Gaussian noise.
#[derive(Debug, Clone)]
pub struct GaussianSampler {
    dims: usize,
    noise: Normal<f64>,
}

impl GaussianSampler {
    pub fn new(dims: usize, sigma: f64) -> Result<Self, NormalError> {
        let noise = Normal::new(0.0, sigma)?;
        Ok(Self { dims, noise })
    }
}

impl Sampler<Heuristic> for GaussianSampler {
    fn seed(&self) -> Heuristic {
        let mut rng = thread_rng();
        Heuristic {
            params: (0..self.dims).map(|_| rng.gen_range(0.0..=1.0)).collect(),
        }
    }

    fn sample(&self, parent: &Candidate<Heuristic>) -> Heuristic {
        let mut rng = thread_rng();
        Heuristic {
            params: parent
                .representation()
                .params
                .iter()
                .map(|p| (p + self.noise.sample(&mut rng)).clamp(0.0, 1.0))
                .collect(),
        }
    }
}

/// ZDT1 with both objectives flipped to "higher is better". Fails a fraction
/// of evaluations at random, the way sandboxed runs time out.
#[derive(Debug, Clone)]
pub struct Zdt1Task {
    pub failure_rate: f64,
}

impl Zdt1Task {
    pub fn objectives(params: &[f64]) -> Option<Vec<f64>> {
        let (&f1, rest) = params.split_first()?;
        let g = if rest.is_empty() {
            1.0
        } else {
            1.0 + 9.0 * rest.iter().sum::<f64>() / rest.len() as f64
        };
        let f2 = g * (1.0 - (f1 / g).sqrt());
        Some(vec![-f1, -f2])
    }
}

impl Evaluator<Heuristic> for Zdt1Task {
    fn evaluate(&self, heuristic: &Heuristic) -> Option<Vec<f64>> {
        if thread_rng().gen_bool(self.failure_rate.clamp(0.0, 1.0)) {
            return None;
        }
        Self::objectives(&heuristic.params)
    }
}
