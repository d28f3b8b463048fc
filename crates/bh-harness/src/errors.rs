use thiserror::Error;

use bh_optimizer::Category;
use bh_types::BhError;

/// Catalog construction failures. Always fatal: no partial catalog is built.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to instantiate {category} variant {variant}: {source}")]
    Instantiation {
        category: Category,
        variant: String,
        #[source]
        source: BhError,
    },
}

/// Failure during one ask/observe round of a scenario.
#[derive(Error, Debug)]
pub enum IterationError {
    #[error("Round {round}: recommendation failed: {source}")]
    Recommend {
        round: usize,
        #[source]
        source: BhError,
    },

    #[error("Round {round}: adding measurements failed: {source}")]
    Measure {
        round: usize,
        #[source]
        source: BhError,
    },

    #[error("Round {round}: expected {expected} candidates, got {actual}")]
    BatchSizeMismatch {
        round: usize,
        expected: usize,
        actual: usize,
    },
}

impl IterationError {
    pub fn round(&self) -> usize {
        match self {
            Self::Recommend { round, .. }
            | Self::Measure { round, .. }
            | Self::BatchSizeMismatch { round, .. } => *round,
        }
    }
}
