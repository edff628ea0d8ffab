//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Everything here is serializable and
//! deterministic.

mod assessment;
mod patient;

pub use assessment::{
    Assessment, BmiStatus, BpStatus, Factor, HealthMetrics, Indicator, Prediction, RiskLabel,
};
pub use patient::{ClinicalInput, FeatureVector, Gender, Level, FEATURE_COUNT, FEATURE_NAMES};

#[cfg(test)]
pub(crate) use patient::sample_input;
