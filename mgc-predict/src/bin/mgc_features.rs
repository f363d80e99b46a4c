//! mgc-features - print the extracted feature vector of an audio file
//!
//! Used to compare the service's features with those of the training
//! pipeline for the same clip.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mgc_predict::features::extract_features;
use mgc_predict::models::FeatureScaler;

/// Command-line arguments for mgc-features
#[derive(Parser, Debug)]
#[command(name = "mgc-features")]
#[command(about = "Extract the 57 genre-classification features from an audio file")]
#[command(version)]
struct Args {
    /// Audio file to analyse
    audio_file: PathBuf,

    /// Also print the vector after applying this scaler
    #[arg(long, env = "MGC_SCALER")]
    scaler: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "mgc_predict=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let bytes = std::fs::read(&args.audio_file)
        .with_context(|| format!("Failed to read {}", args.audio_file.display()))?;
    let features = extract_features(&bytes)
        .with_context(|| format!("Feature extraction failed for {}", args.audio_file.display()))?;

    let mut named = Map::new();
    for (name, value) in features.iter_named() {
        named.insert(name.to_string(), json!(value));
    }

    let mut output = json!({
        "file": args.audio_file.display().to_string(),
        "features": Value::Object(named),
        // Object keys are sorted; this keeps column order
        "vector": features.as_slice(),
    });

    if let Some(path) = &args.scaler {
        let scaler = FeatureScaler::load(path)
            .with_context(|| format!("Failed to load scaler {}", path.display()))?;
        let scaled = scaler.transform(&features).context("Scaling failed")?;
        output["scaled"] = json!(scaled);
    }

    let text = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", text);

    Ok(())
}
