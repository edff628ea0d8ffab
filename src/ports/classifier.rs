//! Classifier port: Trait for the pre-trained risk model.
//!
//! The model itself is an external artifact. The application only relies on
//! the two prediction operations below, never on model internals.

use crate::domain::FeatureVector;

/// Error type for classifier operations.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Artifact missing, corrupt or failed verification. Fatal at startup.
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    /// A prediction call failed for the current request.
    #[error("Classifier invocation failed: {0}")]
    Invocation(String),
}

/// Trait for binary classifiers over the fixed feature layout.
///
/// Implementations are loaded once and never mutated afterwards, so they
/// must be safe to share for concurrent read-only calls.
pub trait Classifier: Send + Sync {
    /// Predict the class index (0 = low risk, 1 = high risk).
    ///
    /// # Errors
    /// Returns `ClassifierError::Invocation` if prediction fails.
    fn predict(&self, features: &FeatureVector) -> Result<usize, ClassifierError>;

    /// Class probability distribution, indexed by class.
    ///
    /// # Errors
    /// Returns `ClassifierError::Invocation` if prediction fails.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError>;
}
