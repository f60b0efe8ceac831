//! Process command - extract transactions from a single statement.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use tally_core::Ledger;

use super::{build_extractor, format_ledger, load_config, source_label, DocumentReport, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input statement (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip the embedded text layer and go straight to OCR
    #[arg(long)]
    ocr_only: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting transactions...");

    let extractor = build_extractor(&config, args.model_dir.as_deref(), args.ocr_only)?;
    let data = fs::read(&args.input)?;
    let source = source_label(&args.input);
    let outcome = extractor.extract(&data, &source);

    pb.finish_and_clear();

    if let Some(diagnostic) = &outcome.diagnostic {
        eprintln!("{} {}: {}", style("⚠").yellow(), source, diagnostic);
    }

    let report = DocumentReport::new(&source, &outcome);
    let mut ledger = Ledger::new();
    ledger.merge(outcome.transactions);

    let output = format_ledger(&ledger, &[report], args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} transactions written to {}",
            style("✓").green(),
            ledger.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
