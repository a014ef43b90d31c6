use lexgate_ai::ClassifyError;
use lexgate_core::ConfigError;
use thiserror::Error;

/// Errors that abort a request or prevent the pipeline from starting.
///
/// Refusals are not errors: they are ordinary responses.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidInput(#[from] ClassifyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
