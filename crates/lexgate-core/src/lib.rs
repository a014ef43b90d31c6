//! Core types for Lexgate: jurisdiction registry, citation rules, and the
//! per-request data model shared by every pipeline stage.

pub mod citation;
pub mod corpus;
mod error;
pub mod jurisdiction;
pub mod registry;
pub mod schema;
pub mod text;
pub mod types;

pub use citation::{CitationValidator, ValidatorConfig};
pub use corpus::CorpusDocument;
pub use error::ConfigError;
pub use jurisdiction::{JurisdictionCode, JurisdictionKind};
pub use registry::{ChainLevel, IndexHandle, IndexScope, Jurisdiction, OfficialSource, Registry};
pub use types::{
    Authority, CitationValidationResult, Decision, JurisdictionClassification, LevelOutcome,
    LevelStatus, RetrievalHit, RetrievalResult, RiskAssessment,
};
