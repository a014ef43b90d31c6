use std::path::PathBuf;

use thiserror::Error;

/// Startup failure while loading the jurisdiction registry or compiling
/// citation rules. Fatal: the service must not accept requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read registry file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed registry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{entry}: field '{field}' must not be empty")]
    EmptyField { entry: String, field: &'static str },

    #[error("malformed jurisdiction code '{0}'")]
    MalformedCode(String),

    #[error("jurisdiction '{0}' is registered twice")]
    DuplicateCode(String),

    #[error("index '{0}' is bound to more than one scope")]
    DuplicateIndex(String),

    #[error("sub-national '{code}' belongs to unregistered country '{country}'")]
    UnknownCountry { code: String, country: String },

    #[error("default national '{0}' is not a registered national jurisdiction")]
    UnknownDefault(String),

    #[error("invalid citation pattern for {code}: {source}")]
    Pattern {
        code: String,
        #[source]
        source: regex::Error,
    },
}
