use std::fmt;

use crate::error::{PopulationError, Result};

/// Objective values of a candidate. Higher is better in every dimension.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Score {
    /// The evaluator produced no score.
    #[default]
    Unscored,
    /// Neutralised score. Ranks below every valid score and is never picked
    /// as a parent.
    Invalid,
    Valid(Vec<f64>),
}

impl Score {
    pub fn is_valid(&self) -> bool {
        matches!(self, Score::Valid(_))
    }

    pub fn values(&self) -> Option<&[f64]> {
        match self {
            Score::Valid(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Checks a raw score against the run's objective count.
    pub fn check(&self, objectives: usize) -> Result<()> {
        let Score::Valid(values) = self else {
            return Ok(());
        };

        if values.len() != objectives {
            return Err(PopulationError::Malformed {
                expected: objectives,
                found: values.len(),
            });
        }

        match values.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(PopulationError::NonFiniteScore {
                index,
                value: values[index],
            }),
            None => Ok(()),
        }
    }

    /// Row of the objective matrix on the minimisation scale. Scores are
    /// negated; anything not valid sits at +inf in every dimension.
    pub fn objective_row(&self, objectives: usize) -> Vec<f64> {
        match self {
            Score::Valid(values) => values.iter().map(|v| -v).collect(),
            _ => vec![f64::INFINITY; objectives],
        }
    }

    /// Bit pattern of a valid score, used for exact-equality lookups.
    pub(crate) fn fingerprint(&self) -> Option<Vec<u64>> {
        // +0.0 folds -0.0 into 0.0 so both compare equal, as `==` does
        self.values()
            .map(|values| values.iter().map(|v| (v + 0.0).to_bits()).collect())
    }
}

impl From<Option<Vec<f64>>> for Score {
    fn from(raw: Option<Vec<f64>>) -> Self {
        match raw {
            Some(values) => Score::Valid(values),
            None => Score::Unscored,
        }
    }
}

impl From<Vec<f64>> for Score {
    fn from(values: Vec<f64>) -> Self {
        Score::Valid(values)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Unscored => write!(f, "unscored"),
            Score::Invalid => write!(f, "invalid"),
            Score::Valid(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:.6}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A scored heuristic. The representation is opaque to the population and is
/// only compared through its `Display` form.
#[derive(Debug, Clone)]
pub struct Candidate<R> {
    representation: R,
    score: Score,
    rank: usize,
    crowding: f64,
}

impl<R> Candidate<R> {
    pub fn new(representation: R, score: impl Into<Score>) -> Self {
        Self {
            representation,
            score: score.into(),
            rank: 0,
            crowding: 0.0,
        }
    }

    pub fn unscored(representation: R) -> Self {
        Self::new(representation, Score::Unscored)
    }

    pub fn representation(&self) -> &R {
        &self.representation
    }

    pub fn into_representation(self) -> R {
        self.representation
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    /// Pareto front index from the last survival step. 0 is best.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn crowding(&self) -> f64 {
        self.crowding
    }

    pub(crate) fn invalidate(&mut self) {
        self.score = Score::Invalid;
    }

    pub(crate) fn assign(&mut self, rank: usize, crowding: f64) {
        self.rank = rank;
        self.crowding = crowding;
    }
}

impl<R: fmt::Display> fmt::Display for Candidate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.representation, f)
    }
}
