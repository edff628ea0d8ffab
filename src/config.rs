//! Environment-driven configuration.
//!
//! | Variable                            | Meaning                                   |
//! |-------------------------------------|-------------------------------------------|
//! | `CARDIORISK_MODEL_PATH`             | Model artifact directory (`models`)       |
//! | `CARDIORISK_MODEL_PUBKEY_B64_FILE`  | Base64 Ed25519 verifying key file         |
//! | `CARDIORISK_ALLOW_UNSIGNED_MODELS`  | Accept models without manifest/signature  |
//! | `CARDIORISK_LOG_MODE`               | `auto`, `file`, `stdout` or `stderr`      |
//! | `CARDIORISK_LOG_FILE`               | Log file used in `file` mode              |

use std::path::PathBuf;

use crate::adapters::logistic::{verifying_key_from_file, ModelLoader};
use crate::CardioriskError;

pub const MODEL_PATH_ENV: &str = "CARDIORISK_MODEL_PATH";
pub const PUBKEY_FILE_ENV: &str = "CARDIORISK_MODEL_PUBKEY_B64_FILE";
pub const ALLOW_UNSIGNED_ENV: &str = "CARDIORISK_ALLOW_UNSIGNED_MODELS";
pub const LOG_MODE_ENV: &str = "CARDIORISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIORISK_LOG_FILE";

const DEFAULT_MODEL_PATH: &str = "models";
const DEFAULT_LOG_FILE: &str = "cardiorisk.log";

/// Truthy values accepted for boolean switches.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

fn bool_env(name: &str) -> bool {
    std::env::var(name).map(|v| parse_bool(&v)).unwrap_or(false)
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// stderr, keeping stdout clean for reports
    Auto,
    File,
    Stdout,
    Stderr,
}

impl std::str::FromStr for LogMode {
    type Err = CardioriskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            other => Err(CardioriskError::Config(format!(
                "Unknown {LOG_MODE_ENV} value: {other:?}"
            ))),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model_path: PathBuf,
    pub pubkey_file: Option<PathBuf>,
    pub allow_unsigned_models: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            pubkey_file: None,
            allow_unsigned_models: false,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `CardioriskError::Config` for unparseable values.
    pub fn from_env() -> Result<Self, CardioriskError> {
        let defaults = Self::default();

        let log_mode = match std::env::var(LOG_MODE_ENV) {
            Ok(v) => v.parse()?,
            Err(_) => defaults.log_mode,
        };

        Ok(Self {
            model_path: std::env::var(MODEL_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            pubkey_file: std::env::var(PUBKEY_FILE_ENV).ok().map(PathBuf::from),
            allow_unsigned_models: bool_env(ALLOW_UNSIGNED_ENV),
            log_mode,
            log_file: std::env::var(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        })
    }

    /// Build a model loader honouring the signing settings.
    ///
    /// # Errors
    /// Returns `ClassifierUnavailable` if the configured key file is unusable.
    pub fn model_loader(&self) -> Result<ModelLoader, CardioriskError> {
        let mut loader = ModelLoader::new().allow_unsigned(self.allow_unsigned_models);
        if let Some(path) = &self.pubkey_file {
            loader = loader.with_verifying_key(verifying_key_from_file(path)?);
        }
        Ok(loader)
    }
}
