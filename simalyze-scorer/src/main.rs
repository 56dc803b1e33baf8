//! simalyze - command-line front end
//!
//! `simalyze analyze <descriptors.json>` resolves and scores every item in a
//! JSON array of descriptors and prints one JSON object per item on stdout.
//! `simalyze decide <score>` evaluates the display policy alone.
//!
//! Logs go to stderr. Level comes from `RUST_LOG`, else the config file's
//! `[logging] level`, else `info`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use simalyze_common::config::{load_config, TomlConfig};
use simalyze_scorer::{
    decide, Analyzer, AnalyzerConfig, DisplaySettings, ItemDescriptor, ScoreTier,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line arguments for simalyze
#[derive(Parser, Debug)]
#[command(name = "simalyze")]
#[command(about = "Score feed items and decide how to display them")]
#[command(version)]
struct Args {
    /// Config file (overrides SIMALYZE_CONFIG and the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a JSON array of item descriptors
    Analyze {
        /// Path to the descriptors file
        descriptors: PathBuf,

        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Show the display decision for a score
    Decide {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        score: u8,

        #[command(flatten)]
        display: DisplayArgs,
    },
}

/// Display overrides; unset flags keep the configured value
#[derive(clap::Args, Debug)]
struct DisplayArgs {
    /// Hide items scoring below 30
    #[arg(long)]
    hide: bool,

    /// Blur items scoring below 50
    #[arg(long)]
    blur: bool,

    /// Highlight items at or above the threshold
    #[arg(long)]
    highlight: bool,

    /// Highlight threshold (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: Option<u8>,
}

impl DisplayArgs {
    fn apply(&self, mut settings: DisplaySettings) -> DisplaySettings {
        settings.toggles.hide_enabled |= self.hide;
        settings.toggles.blur_enabled |= self.blur;
        settings.toggles.highlight_enabled |= self.highlight;
        if let Some(threshold) = self.threshold {
            settings.highlight_threshold = threshold;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&file);

    let mut config = AnalyzerConfig::from_toml(&file).context("Invalid configuration")?;

    match args.command {
        Command::Analyze {
            descriptors,
            display,
        } => {
            config.display = display.apply(config.display);
            analyze(&config, &descriptors).await
        }
        Command::Decide { score, display } => {
            let settings = display.apply(config.display);
            let decision = decide(score, settings.toggles, settings.highlight_threshold);
            println!(
                "{}",
                json!({
                    "score": score,
                    "decision": decision,
                    "tier": ScoreTier::of(score),
                })
            );
            Ok(())
        }
    }
}

fn init_tracing(file: &TomlConfig) {
    let fallback = file.logging.level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn analyze(config: &AnalyzerConfig, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let descriptors: Vec<ItemDescriptor> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let descriptors: Vec<ItemDescriptor> =
        descriptors.into_iter().map(ItemDescriptor::normalized).collect();

    info!(
        items = descriptors.len(),
        api = %config.api_base_url,
        "Starting analysis"
    );

    let analyzer = Analyzer::with_http(config).context("Failed to build analyzer")?;
    for item in analyzer.analyze_all(&descriptors).await {
        println!(
            "{}",
            json!({
                "key": item.key.to_string(),
                "score": item.result.composite_score,
                "summary": item.result.summary,
                "tier": item.tier,
                "decision": item.decision,
                "breakdown": item.result.breakdown,
            })
        );
    }

    Ok(())
}
