//! Text command - dump the raw page lines a statement yields.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use tally_core::{LazyRecognizer, OcrSource, PdfExtractor, RasterOcr, TextLayerSource};

use super::load_config;

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Input statement (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Read the scanned page images with OCR instead of the text layer
    #[arg(long)]
    ocr: bool,

    /// Render resolution for OCR (default: from config)
    #[arg(long)]
    dpi: Option<u32>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.ocr.model_dir = dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let data = fs::read(&args.input)?;

    let pages = if args.ocr {
        let dpi = args.dpi.unwrap_or(config.ocr.render_dpi);
        info!("Recognizing {} at {} dpi", args.input.display(), dpi);
        RasterOcr::from_config(LazyRecognizer::new(config.ocr.clone()), &config)
            .page_texts(&data, dpi)?
    } else {
        PdfExtractor::new()
            .with_max_pages(config.pdf.max_pages)
            .page_texts(&data)?
    };

    let source = if args.ocr { "OCR" } else { "text layer" };
    println!("{} {} ({})", style("Raw lines of").bold(), args.input.display(), source);

    if pages.is_empty() {
        println!("No scanned page images found.");
        return Ok(());
    }

    for (i, text) in pages.iter().enumerate() {
        println!();
        println!("{}", style(format!("--- Page {} ---", i + 1)).cyan());
        if text.trim().is_empty() {
            println!("No text found on this page.");
            continue;
        }
        // Debug formatting shows tabs, odd spaces and control characters.
        for line in text.lines() {
            println!("{:?}", line);
        }
    }

    Ok(())
}
