//! One-shot layer intersection check.
//!
//! Reads a JSON coordinate list and prints the verdict document.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use couche::config::Config;
use couche::Coordinate;

#[derive(Parser, Debug)]
#[command(name = "check")]
#[command(about = "Check a polygon against the reference layers")]
struct Args {
    /// JSON file with [{"x": .., "y": ..}, ...]
    #[arg(short = 'f', long, required_unless_present = "list")]
    coordinates: Option<PathBuf>,

    /// Only list available layers
    #[arg(long)]
    list: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the layer files (overrides config)
    #[arg(long)]
    layers_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(dir) = args.layers_dir {
        config.layers.dir = dir;
    }
    let evaluator = config.evaluator();

    if args.list {
        let layers = evaluator.list_layers();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "layers": layers }))?
        );
        return Ok(());
    }

    let path = args
        .coordinates
        .context("--coordinates is required unless --list is given")?;
    let file = File::open(&path)
        .with_context(|| format!("Failed to open coordinate file: {}", path.display()))?;
    let coordinates: Vec<Coordinate> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse coordinate file: {}", path.display()))?;

    info!("Checking {} coordinates", coordinates.len());
    let evaluation = evaluator.evaluate(&coordinates)?;

    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}
