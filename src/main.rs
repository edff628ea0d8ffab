//! cardiorisk: cardiovascular risk assessment from the command line.
//!
//! Main entry point: validates a clinical input, loads the classifier once,
//! and prints the assessment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::redact::RedactingMakeWriter;
use cardiorisk::config::{Config, LogMode};
use cardiorisk::domain::{ClinicalInput, Gender, Level};
use cardiorisk::report::render_text;
use cardiorisk::{CardioriskError, RiskAssessor};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    Normal,
    AboveNormal,
    WellAboveNormal,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Self::Male,
            GenderArg::Female => Self::Female,
        }
    }
}

impl From<LevelArg> for Level {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Normal => Self::Normal,
            LevelArg::AboveNormal => Self::AboveNormal,
            LevelArg::WellAboveNormal => Self::WellAboveNormal,
        }
    }
}

/// Assess cardiovascular disease risk with a pre-trained classifier.
#[derive(Debug, Parser)]
#[command(name = "cardiorisk", version, about)]
struct Cli {
    /// Age in years (20-80)
    #[arg(long)]
    age: u32,

    /// Height in cm (140-210)
    #[arg(long)]
    height: f64,

    /// Weight in kg (40-150)
    #[arg(long)]
    weight: f64,

    /// Systolic blood pressure in mmHg (80-200)
    #[arg(long)]
    systolic: u32,

    /// Diastolic blood pressure in mmHg (50-150)
    #[arg(long)]
    diastolic: u32,

    #[arg(long, value_enum)]
    gender: GenderArg,

    #[arg(long, value_enum, default_value = "normal")]
    cholesterol: LevelArg,

    #[arg(long, value_enum, default_value = "normal")]
    glucose: LevelArg,

    #[arg(long)]
    smoker: bool,

    #[arg(long)]
    alcohol: bool,

    /// Physically active (150+ min/week)
    #[arg(long)]
    active: bool,

    /// Model artifact directory [env: CARDIORISK_MODEL_PATH]
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Base64 Ed25519 verifying key file [env: CARDIORISK_MODEL_PUBKEY_B64_FILE]
    #[arg(long)]
    pubkey_file: Option<PathBuf>,

    /// Accept models without manifest and signature [env: CARDIORISK_ALLOW_UNSIGNED_MODELS]
    #[arg(long)]
    allow_unsigned: bool,

    /// Print the assessment as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn clinical_input(&self) -> ClinicalInput {
        ClinicalInput {
            age: self.age,
            height_cm: self.height,
            weight_kg: self.weight,
            systolic: self.systolic,
            diastolic: self.diastolic,
            gender: self.gender.into(),
            cholesterol: self.cholesterol.into(),
            glucose: self.glucose.into(),
            smoker: self.smoker,
            drinks_alcohol: self.alcohol,
            physically_active: self.active,
        }
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.model_dir {
            config.model_path = dir.clone();
        }
        if let Some(file) = &self.pubkey_file {
            config.pubkey_file = Some(file.clone());
        }
        if self.allow_unsigned {
            config.allow_unsigned_models = true;
        }
    }
}

fn init_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Reports go to stdout, so logs default to stderr.
    let (writer, guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces on open below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogMode::Auto | LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(RedactingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    cli.apply_overrides(&mut config);

    let _guard = init_logging(&config)?;

    let input = cli.clinical_input();
    if let Err(errors) = input.validate() {
        return Err(CardioriskError::Validation(errors.join("; ")).into());
    }

    // Refuse to assess if the model cannot be loaded/verified.
    let classifier = config
        .model_loader()?
        .load(&config.model_path)
        .map_err(CardioriskError::from)
        .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;
    let assessor = RiskAssessor::new(Arc::new(classifier));
    tracing::info!("Model loaded from {:?}", config.model_path);

    let assessment = assessor.assess(&input)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print!("{}", render_text(&assessment));
    }

    Ok(())
}
