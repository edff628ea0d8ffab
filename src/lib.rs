//! # cardiorisk
//!
//! Cardiovascular risk assessment from biometric and lifestyle inputs.
//!
//! This crate provides:
//! - Encoding of clinical inputs into a classifier's fixed feature layout
//! - Risk classification through an injected, pre-trained classifier
//! - Rule-based risk/protective factor explanation and health metrics
//! - Integrity-checked loading of a logistic regression model artifact
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ClinicalInput, FeatureVector, Assessment)
//! - `ports`: Trait definitions for external collaborators (Classifier)
//! - `adapters`: Concrete implementations (logistic model, log redaction)
//! - `application`: Use cases orchestrating domain and ports
//! - `report`: Plain-text rendering of an assessment

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod report;

pub use application::RiskAssessor;
pub use domain::{Assessment, ClinicalInput, FeatureVector, RiskLabel};

/// Result type for cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Classifier invocation failed: {0}")]
    ClassifierInvocation(String),

    #[error("Invalid clinical input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ports::ClassifierError> for CardioriskError {
    fn from(err: ports::ClassifierError) -> Self {
        match err {
            ports::ClassifierError::Unavailable(msg) => Self::ClassifierUnavailable(msg),
            ports::ClassifierError::Invocation(msg) => Self::ClassifierInvocation(msg),
        }
    }
}
