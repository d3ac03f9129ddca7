use thiserror::Error;
use uuid::Uuid;

/// Reasons a vote cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVote {
    #[error("overall rating {0} is outside 1..=5")]
    RatingOutOfRange(i64),
    #[error("a vote needs a V-scale or a Font grade")]
    MissingGrade,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no vote with id {0}")]
    UnknownVote(Uuid),
    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: InvalidVote,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
