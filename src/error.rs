use thiserror::Error;

pub type Result<T> = std::result::Result<T, PopulationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopulationError {
    #[error("invalid population config: {0}")]
    InvalidConfig(String),

    /// The evaluator returned a score vector of the wrong arity.
    #[error("malformed score: expected {expected} objectives, found {found}")]
    Malformed { expected: usize, found: usize },

    #[error("score component {index} is not finite ({value})")]
    NonFiniteScore { index: usize, value: f64 },

    #[error("survival selection on an empty pool")]
    EmptyPool,

    #[error("crowding distance is NaN for pool index {0}")]
    NonFiniteCrowding(usize),

    #[error("survival strategy failed: {0}")]
    Survival(String),

    /// Parent selection found no member with a valid score.
    #[error("no candidate with a valid score to select as parent")]
    NoValidCandidate,
}
