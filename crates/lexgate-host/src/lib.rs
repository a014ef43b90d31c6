//! Query pipeline host: wires classification, hierarchical retrieval, risk
//! gating, drafting, and answer assembly into one request lifecycle with an
//! audit trail.

pub mod assembler;
pub mod drafter;
mod error;
pub mod pipeline;

pub use assembler::{AnswerAssembler, Citation, FinalResponse, RefusalKind};
pub use drafter::{Drafter, ExtractiveDrafter};
pub use error::PipelineError;
pub use pipeline::{
    AuditRecord, Pipeline, PipelineConfig, PipelineOutcome, PipelineState, QueryRequest,
};
