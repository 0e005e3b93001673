//! Error types.
//!
//! Cancellation is a normal way for a run to end and is not represented
//! here; see [`crate::ga::EngineState::Cancelled`].

use thiserror::Error;

/// A configuration that cannot produce a meaningful run.
///
/// Returned by [`crate::ga::GeneConfig::validate`] before any generation is
/// executed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A tour whose internal state breaks its invariants.
///
/// This signals a defect in the pipeline that produced the tour, never a
/// transient condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TourError {
    #[error("corrupt tour: order has {actual} entries but the city map has {expected}")]
    Corrupt { expected: usize, actual: usize },

    #[error("corrupt tour: city {identity} is not in a map of {city_count} cities")]
    UnknownCity { identity: usize, city_count: usize },
}

/// Failure of an engine run.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tour(#[from] TourError),

    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("engine thread panicked")]
    TaskPanicked,
}

pub type EvolveResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_tour_message() {
        let err = TourError::Corrupt {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "corrupt tour: order has 3 entries but the city map has 4"
        );
    }

    #[test]
    fn test_engine_error_from_tour_error() {
        let err: EngineError = TourError::Corrupt {
            expected: 2,
            actual: 0,
        }
        .into();
        assert!(matches!(err, EngineError::Tour(_)));
    }
}
