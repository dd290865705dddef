use sparkfluence_core::error::CoreError;
use sparkfluence_providers::ProviderError;

/// Errors raised while creating, processing, or polling generation jobs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A credential needed for this job is not configured.
    #[error("{0} not configured")]
    MissingKey(&'static str),

    #[error("Job not found")]
    JobNotFound,

    #[error("Job has no image URL")]
    NoImage,
}
