//! Model signing utility for cardiorisk classifier artifacts.
//!
//! Writes `manifest.json` (SHA-256 of each bound file) and `model.sig`
//! (Ed25519 signature over the manifest bytes) into a model directory.
//!
//! # Usage
//!
//! ```bash
//! CARDIORISK_MODEL_SIGNING_KEY_B64_FILE=/path/to/seed.b64 \
//!     cargo run --bin sign_model -- models [--extra notes.txt]
//! ```
//!
//! The seed file holds 32 random bytes, base64 encoded. The matching
//! verifying key is printed in base64 for `CARDIORISK_MODEL_PUBKEY_B64_FILE`.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use clap::Parser;
use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cardiorisk::adapters::logistic::{
    SignedModelManifest, ARTIFACT_FILE, MANIFEST_FILE, SIGNATURE_FILE,
};

const KEY_FILE_ENV: &str = "CARDIORISK_MODEL_SIGNING_KEY_B64_FILE";

/// Sign a classifier artifact directory.
#[derive(Debug, Parser)]
#[command(name = "sign_model", version, about)]
struct Args {
    /// Directory containing classifier.json
    model_dir: PathBuf,

    /// Additional files in the directory to bind into the manifest
    #[arg(long)]
    extra: Vec<String>,
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed() -> Result<Seed> {
    let path = std::env::var(KEY_FILE_ENV)
        .map_err(|_| anyhow!("Missing signing key. Set {KEY_FILE_ENV} to a base64 seed file."))?;

    let content = Zeroizing::new(
        fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .context("Invalid base64 in signing key")?,
    );

    if raw.len() != 32 {
        bail!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        );
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let model_dir = if args.model_dir.is_file() {
        args.model_dir
            .parent()
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?
            .to_path_buf()
    } else {
        args.model_dir
    };

    if !model_dir.join(ARTIFACT_FILE).exists() {
        bail!("No {ARTIFACT_FILE} found in {model_dir:?}");
    }

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let mut files = vec![ARTIFACT_FILE];
    files.extend(args.extra.iter().map(String::as_str));

    let manifest = SignedModelManifest::for_files(&model_dir, &files)
        .with_context(|| format!("Failed hashing files in {model_dir:?}"))?;
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "Verifying key (base64): {}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}
