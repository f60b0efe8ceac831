//! Batch processing command for multiple statements.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use tally_core::Ledger;

use super::{build_extractor, format_ledger, load_config, source_label, DocumentReport, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of statements, e.g. "statements/*.pdf"
    #[arg(required = true)]
    input: String,

    /// Output file for the combined ledger (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write a per-document CSV report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Continue when a file cannot be read
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip the embedded text layer and go straight to OCR
    #[arg(long)]
    ocr_only: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching PDF files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} statements to process",
        style("ℹ").blue(),
        files.len()
    );

    let extractor = build_extractor(&config, args.model_dir.as_deref(), args.ocr_only)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut ledger = Ledger::new();
    let mut documents = Vec::with_capacity(files.len());

    for path in &files {
        let source = source_label(path);
        pb.set_message(source.clone());

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                let e = anyhow::Error::from(e);
                if args.continue_on_error {
                    warn!("Failed to read {}: {}", path.display(), e);
                    documents.push(DocumentReport::unreadable(&source, &e));
                    pb.inc(1);
                    continue;
                }
                error!("Failed to read {}: {}", path.display(), e);
                return Err(e.context(format!("reading {}", path.display())));
            }
        };

        let outcome = extractor.extract(&data, &source);
        documents.push(DocumentReport::new(&source, &outcome));
        let added = ledger.merge(outcome.transactions);
        debug!("{}: {} new transactions", source, added);

        pb.inc(1);
    }

    pb.finish_and_clear();

    let output = format_ledger(&ledger, &documents, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Ledger written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if let Some(report_path) = &args.report {
        write_report(report_path, &documents)?;
        eprintln!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    let failed: Vec<&DocumentReport> = documents.iter().filter(|d| d.transactions == 0).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} statements in {:?}: {} transactions",
        style("✓").green(),
        documents.len(),
        start.elapsed(),
        ledger.len()
    );

    if !failed.is_empty() {
        eprintln!("{}", style("Statements without transactions:").yellow());
        for doc in failed {
            let reason = doc
                .diagnostic
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no transactions found".to_string());
            eprintln!("  - {}: {}", doc.source, reason);
        }
    }

    Ok(())
}

fn write_report(path: &PathBuf, documents: &[DocumentReport]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "strategy", "transactions", "diagnostic"])?;

    for doc in documents {
        wtr.write_record([
            doc.source.as_str(),
            &doc.strategy.map(|s| s.to_string()).unwrap_or_default(),
            &doc.transactions.to_string(),
            &doc.diagnostic.as_ref().map(|d| d.to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
