//! Logistic adapter: Implementation of Classifier for a standardized
//! logistic regression exported as JSON.
//!
//! # Artifact layout
//!
//! A model directory contains:
//! - `classifier.json`: scaler statistics, coefficients, intercept, threshold
//! - `manifest.json`: SHA-256 of every bound file (optional in unsigned mode)
//! - `model.sig`: Ed25519 signature over the manifest bytes (optional in unsigned mode)
//!
//! # Security
//!
//! - A signed model is only accepted if the signature verifies against the
//!   configured verifying key AND every file hash in the manifest matches
//! - `classifier.json` must be bound by the manifest
//! - Unsigned models load only when explicitly allowed
//!
//! # Thread Safety
//!
//! The loaded classifier is never mutated, so a single `Arc<LogisticClassifier>`
//! can serve concurrent requests without locking.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{Classifier, ClassifierError};

/// Model parameters file inside an artifact directory.
pub const ARTIFACT_FILE: &str = "classifier.json";

/// Signed list of file hashes.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Raw 64-byte Ed25519 signature of `manifest.json`.
pub const SIGNATURE_FILE: &str = "model.sig";

const ARTIFACT_FORMAT_VERSION: u32 = 1;
const MANIFEST_VERSION: u32 = 1;

/// Standardized logistic regression parameters.
///
/// Each feature is scaled as `(x - scaler_mean) / scaler_scale` before the
/// linear combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub threshold: f64,
}

impl ClassifierArtifact {
    /// Check the artifact against the feature contract and basic numeric sanity.
    ///
    /// # Errors
    /// Returns `ClassifierError::Unavailable` describing the first problem found.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ClassifierError::Unavailable(format!(
                "Unsupported artifact format_version: {}",
                self.format_version
            )));
        }

        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(got, want)| got != want)
        {
            return Err(ClassifierError::Unavailable(format!(
                "Feature layout mismatch: expected {:?}, got {:?}",
                FEATURE_NAMES, self.feature_names
            )));
        }

        if self.coefficients.len() != FEATURE_COUNT
            || self.scaler_mean.len() != FEATURE_COUNT
            || self.scaler_scale.len() != FEATURE_COUNT
        {
            return Err(ClassifierError::Unavailable(
                "Model parameter lengths do not match feature_names length".into(),
            ));
        }

        let all_finite = self
            .coefficients
            .iter()
            .chain(&self.scaler_mean)
            .chain(&self.scaler_scale)
            .chain(std::iter::once(&self.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ClassifierError::Unavailable(
                "Model parameters contain non-finite values".into(),
            ));
        }

        if let Some(i) = self.scaler_scale.iter().position(|s| *s <= 0.0) {
            return Err(ClassifierError::Unavailable(format!(
                "Invalid scaler_scale for {} (must be > 0)",
                FEATURE_NAMES[i]
            )));
        }

        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ClassifierError::Unavailable(format!(
                "Invalid threshold {} (must be in (0, 1))",
                self.threshold
            )));
        }

        Ok(())
    }
}

/// Manifest binding artifact files to their SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedModelManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl SignedModelManifest {
    /// Build a manifest over the given files in `dir`.
    ///
    /// # Errors
    /// Returns an IO error if any file cannot be read.
    pub fn for_files(dir: &Path, files: &[&str]) -> std::io::Result<Self> {
        let mut map = BTreeMap::new();
        for rel in files {
            let bytes = fs::read(dir.join(rel))?;
            map.insert((*rel).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            files: map,
        })
    }
}

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ClassifierError::Unavailable` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ClassifierError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ClassifierError::Unavailable("Invalid public key base64".into()))?;
    let pubkey: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ClassifierError::Unavailable("Invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&pubkey)
        .map_err(|_| ClassifierError::Unavailable("Invalid verifying key".into()))
}

/// Read a base64 Ed25519 verifying key from a file.
///
/// # Errors
/// Returns `ClassifierError::Unavailable` if the file cannot be read or the
/// key is malformed.
pub fn verifying_key_from_file(path: &Path) -> Result<VerifyingKey, ClassifierError> {
    let b64 = fs::read_to_string(path).map_err(|e| {
        ClassifierError::Unavailable(format!("Failed reading pubkey file {path:?}: {e}"))
    })?;
    verifying_key_from_b64(&b64)
}

/// Loads and verifies classifier artifacts.
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    verifying_key: Option<VerifyingKey>,
    allow_unsigned: bool,
}

impl ModelLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key used to verify `model.sig`.
    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    /// Accept artifact directories without manifest and signature.
    #[must_use]
    pub fn allow_unsigned(mut self, allow: bool) -> Self {
        self.allow_unsigned = allow;
        self
    }

    /// Load a classifier from an artifact directory (or a direct path to
    /// `classifier.json`).
    ///
    /// # Errors
    /// Returns `ClassifierError::Unavailable` if the artifact is missing,
    /// corrupt, fails verification or does not match the feature layout.
    pub fn load(&self, model_path: &Path) -> Result<LogisticClassifier, ClassifierError> {
        let base_dir = artifact_dir(model_path)?;

        if !base_dir.exists() {
            return Err(ClassifierError::Unavailable(format!(
                "Model path not found at {model_path:?}"
            )));
        }

        self.verify_signature(&base_dir)?;

        let artifact_path = base_dir.join(ARTIFACT_FILE);
        let content = fs::read_to_string(&artifact_path).map_err(|e| {
            ClassifierError::Unavailable(format!("Failed to read {artifact_path:?}: {e}"))
        })?;
        let artifact: ClassifierArtifact = serde_json::from_str(&content).map_err(|e| {
            ClassifierError::Unavailable(format!("Invalid {ARTIFACT_FILE} format: {e}"))
        })?;
        artifact.validate()?;

        tracing::info!(
            "Loaded classifier from {:?} (n_features={}, threshold={})",
            artifact_path,
            artifact.feature_names.len(),
            artifact.threshold
        );

        Ok(LogisticClassifier { artifact })
    }

    /// Verify `model.sig` over `manifest.json` and every hash it lists.
    fn verify_signature(&self, base_dir: &Path) -> Result<(), ClassifierError> {
        let sig_path = base_dir.join(SIGNATURE_FILE);
        let manifest_path = base_dir.join(MANIFEST_FILE);

        if !sig_path.exists() || !manifest_path.exists() {
            if self.allow_unsigned {
                tracing::warn!(
                    "Loading UNSIGNED model from {:?} (unsigned models explicitly allowed)",
                    base_dir
                );
                return Ok(());
            }
            tracing::error!("Model signature not found at {:?}", sig_path);
            return Err(ClassifierError::Unavailable(format!(
                "Model signature required: {SIGNATURE_FILE} and {MANIFEST_FILE} missing in {base_dir:?}"
            )));
        }

        let public_key = self.verifying_key.as_ref().ok_or_else(|| {
            ClassifierError::Unavailable(
                "Signed model found but no verifying key is configured".into(),
            )
        })?;

        let sig_bytes = fs::read(&sig_path).map_err(|e| {
            ClassifierError::Unavailable(format!("Failed to read signature: {e}"))
        })?;
        let sig_bytes: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
            ClassifierError::Unavailable("Invalid signature length (expected 64 bytes)".into())
        })?;
        let signature = Signature::from_bytes(&sig_bytes);

        let manifest_content = fs::read(&manifest_path).map_err(|e| {
            ClassifierError::Unavailable(format!("Failed to read manifest: {e}"))
        })?;
        public_key
            .verify(&manifest_content, &signature)
            .map_err(|_| ClassifierError::Unavailable("Invalid model signature".into()))?;

        let manifest: SignedModelManifest = serde_json::from_slice(&manifest_content)
            .map_err(|e| ClassifierError::Unavailable(format!("Invalid manifest format: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ClassifierError::Unavailable(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }
        if !manifest.files.contains_key(ARTIFACT_FILE) {
            return Err(ClassifierError::Unavailable(format!(
                "{MANIFEST_FILE} must include {ARTIFACT_FILE}"
            )));
        }

        for (rel, expected_hex) in &manifest.files {
            let path = base_dir.join(rel);
            let bytes = fs::read(&path).map_err(|e| {
                ClassifierError::Unavailable(format!(
                    "Manifest references missing/unreadable file {path:?}: {e}"
                ))
            })?;
            if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
                return Err(ClassifierError::Unavailable(format!(
                    "File hash mismatch for {rel}"
                )));
            }
        }

        tracing::info!("Model signature and hashes verified successfully");
        Ok(())
    }
}

/// Resolve the artifact directory for `model_path`.
///
/// A file path must name `classifier.json` itself, since the manifest binds
/// that file name. A bare file name resolves to the current directory.
fn artifact_dir(model_path: &Path) -> Result<PathBuf, ClassifierError> {
    if model_path.is_dir() {
        return Ok(model_path.to_path_buf());
    }

    if model_path.file_name().and_then(|n| n.to_str()) != Some(ARTIFACT_FILE) {
        return Err(ClassifierError::Unavailable(format!(
            "Model path {model_path:?} is neither a directory nor a {ARTIFACT_FILE} file"
        )));
    }

    Ok(match model_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    })
}

/// In-process logistic regression classifier.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    artifact: ClassifierArtifact,
}

impl LogisticClassifier {
    /// Build a classifier from already-loaded parameters.
    ///
    /// # Errors
    /// Returns `ClassifierError::Unavailable` if the parameters are invalid.
    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ClassifierError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    #[must_use]
    pub fn artifact(&self) -> &ClassifierArtifact {
        &self.artifact
    }

    /// Probability of the positive (high risk) class.
    fn positive_probability(&self, features: &FeatureVector) -> Result<f64, ClassifierError> {
        let a = &self.artifact;
        let mut z = a.intercept;
        for (i, x) in features.as_slice().iter().enumerate() {
            if !x.is_finite() {
                return Err(ClassifierError::Invocation(format!(
                    "Feature {} is not finite: {x}",
                    FEATURE_NAMES[i]
                )));
            }
            z += a.coefficients[i] * (x - a.scaler_mean[i]) / a.scaler_scale[i];
        }
        Ok(sigmoid(z))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for LogisticClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<usize, ClassifierError> {
        let p = self.positive_probability(features)?;
        Ok(usize::from(p >= self.artifact.threshold))
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        let p = self.positive_probability(features)?;
        Ok(vec![1.0 - p, p])
    }
}
