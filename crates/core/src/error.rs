use std::path::PathBuf;

use thiserror::Error;

use crate::Month;

#[derive(Error, Debug)]
pub enum RewardError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(String),

    #[error("Conservation violated ({context}): expected {expected}, got {actual}")]
    ConservationViolation {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Month out of order: expected {expected}, got {got}")]
    MonthOutOfOrder { expected: Month, got: Month },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Query error: {0}")]
    Query(String),
}

impl RewardError {
    /// Wrap an I/O failure together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RewardError>;
