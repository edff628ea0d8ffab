//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: in-process logistic regression classifier with artifact verification
//! - `redact`: clinical-data filtering for logs

pub mod logistic;
pub mod redact;

pub use logistic::{LogisticClassifier, ModelLoader};
