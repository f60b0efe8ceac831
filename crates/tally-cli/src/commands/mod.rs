//! Subcommands and the output formatting they share.

pub mod batch;
pub mod categories;
pub mod config;
pub mod process;
pub mod text;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use tally_core::statement::rules::format_amount;
use tally_core::{
    Diagnostic, ExtractionOutcome, LazyRecognizer, Ledger, LedgerSummary, PdfExtractor,
    RasterOcr, StatementExtractor, Strategy, TallyConfig, Transaction,
};

/// Extractor wired to the PDF text layer and the lazily loaded OCR models.
pub type Extractor = StatementExtractor<PdfExtractor, RasterOcr<LazyRecognizer>>;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text table with category totals
    Text,
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

/// Load the explicit config file, else the default one if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<TallyConfig> {
    if let Some(path) = config_path {
        return Ok(TallyConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(TallyConfig::from_file(&default_path)?)
    } else {
        Ok(TallyConfig::default())
    }
}

/// Build an extractor from config, optionally overriding the model directory.
pub fn build_extractor(
    config: &TallyConfig,
    model_dir: Option<&Path>,
    ocr_only: bool,
) -> anyhow::Result<Extractor> {
    let mut config = config.clone();
    if let Some(dir) = model_dir {
        config.ocr.model_dir = dir.to_path_buf();
    }
    if ocr_only {
        config.pdf.prefer_embedded_text = false;
    }

    if !config.ocr.models_available() {
        debug!(
            "OCR models not found in {}; scanned statements will report a diagnostic",
            config.ocr.model_dir.display()
        );
    }

    let text_layer = PdfExtractor::new().with_max_pages(config.pdf.max_pages);
    let ocr = RasterOcr::from_config(LazyRecognizer::new(config.ocr.clone()), &config);
    Ok(StatementExtractor::from_config(text_layer, ocr, &config)?)
}

/// Per-document line of a report.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    pub transactions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

impl DocumentReport {
    pub fn new(source: &str, outcome: &ExtractionOutcome) -> Self {
        Self {
            source: source.to_string(),
            strategy: outcome.strategy,
            transactions: outcome.transactions.len(),
            diagnostic: outcome.diagnostic.clone(),
        }
    }

    /// Document that could not even be read.
    pub fn unreadable(source: &str, error: &anyhow::Error) -> Self {
        Self {
            source: source.to_string(),
            strategy: None,
            transactions: 0,
            diagnostic: Some(Diagnostic::StageFailed {
                strategy: Strategy::TextLayer,
                reason: error.to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    documents: &'a [DocumentReport],
    transactions: &'a [Transaction],
    summary: LedgerSummary,
}

/// Render the ledger in the requested format.
pub fn format_ledger(
    ledger: &Ledger,
    documents: &[DocumentReport],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&Report {
            documents,
            transactions: ledger.transactions(),
            summary: ledger.summary(),
        })?),
        OutputFormat::Csv => format_csv(ledger),
        OutputFormat::Text => Ok(format_text(ledger)),
    }
}

fn format_csv(ledger: &Ledger) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["date", "description", "amount", "category", "source"])?;

    for txn in ledger {
        wtr.write_record([
            &txn.date().to_string(),
            txn.description(),
            &txn.amount().to_string(),
            txn.category().label(),
            txn.source(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(ledger: &Ledger) -> String {
    let mut output = String::new();

    if ledger.is_empty() {
        output.push_str("No transactions.\n");
        return output;
    }

    let width = ledger
        .iter()
        .map(|t| t.description().chars().count())
        .max()
        .unwrap_or(0)
        .min(48);

    for txn in ledger {
        let _ = writeln!(
            output,
            "{}  {:<width$}  {:>12}  {:<14} {}",
            txn.date(),
            truncate(txn.description(), width),
            format_amount(txn.amount()),
            txn.category().label(),
            txn.source(),
            width = width
        );
    }

    let summary = ledger.summary();
    output.push('\n');
    output.push_str("Summary:\n");
    for total in &summary.categories {
        let _ = writeln!(
            output,
            "  {:<14} {:>4}  {:>12}",
            total.category.label(),
            total.count,
            format_amount(total.total)
        );
    }
    let _ = writeln!(
        output,
        "  {:<14} {:>4}  {:>12}",
        "Total",
        summary.count,
        format_amount(summary.total)
    );

    output
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// File name used as the record source label.
pub fn source_label(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
