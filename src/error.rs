use thiserror::Error;

/// Request-level failures of the statistics path.
///
/// Everything except `Storage` is raised before the store is queried or any
/// backfill work starts, so a failed request never yields partial output.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("ranking algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    #[error("recency window '{0}' is not supported")]
    UnsupportedRecencyWindow(String),

    #[error("granularity '{0}' is not supported")]
    UnsupportedGranularity(String),

    #[error("storage failure: {0:#}")]
    Storage(#[source] anyhow::Error),
}

impl StatsError {
    pub fn validation(message: impl Into<String>) -> Self {
        StatsError::Validation(message.into())
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
