use thiserror::Error;

/// The request could not be understood. Distinct from a refusal, which is a
/// successful outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("invalid input: query is empty")]
    EmptyQuery,
}
