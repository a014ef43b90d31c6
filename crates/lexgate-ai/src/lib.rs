//! Decision layer: jurisdiction classification, risk-signal detection, and
//! the risk-gated ANSWER/REFUSE engine.

pub mod classifier;
mod error;
pub mod risk;
pub mod signals;

pub use classifier::JurisdictionClassifier;
pub use error::ClassifyError;
pub use risk::{EvidenceMetrics, RiskConfig, RiskEngine};
pub use signals::{DomainSignal, RiskSignalDetector};
