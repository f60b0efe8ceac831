//! Strategy dispatch: text layer first, OCR when that finds nothing.

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Result, TallyError};
use crate::models::config::TallyConfig;
use crate::ocr::OcrSource;
use crate::pdf::TextLayerSource;

use super::rules::{currency_amount_pattern, KeywordTable, DEFAULT_CURRENCY_AMOUNT};
use super::{ExtractionOutcome, LineParser, OcrLineParser, StageOutcome, Strategy, TextLineParser};

/// Extracts transactions from a statement document.
///
/// Holds no per-document state, so one extractor can process any number of
/// documents and the same bytes always give the same outcome.
pub struct StatementExtractor<T: TextLayerSource, O: OcrSource> {
    text_layer: T,
    ocr: O,
    table: KeywordTable,
    currency_amount: Regex,
    render_dpi: u32,
    text_layer_enabled: bool,
}

impl<T: TextLayerSource, O: OcrSource> StatementExtractor<T, O> {
    /// Create an extractor with the built-in keyword table and PHP amounts.
    pub fn new(text_layer: T, ocr: O) -> Self {
        Self {
            text_layer,
            ocr,
            table: KeywordTable::default(),
            currency_amount: DEFAULT_CURRENCY_AMOUNT.clone(),
            render_dpi: 300,
            text_layer_enabled: true,
        }
    }

    /// Create an extractor from configuration.
    pub fn from_config(text_layer: T, ocr: O, config: &TallyConfig) -> Result<Self> {
        Ok(Self::new(text_layer, ocr)
            .with_keyword_table(config.keyword_table())
            .with_currency_codes(&config.extraction.currency_codes)?
            .with_render_dpi(config.ocr.render_dpi)
            .with_text_layer_enabled(config.pdf.prefer_embedded_text))
    }

    pub fn with_keyword_table(mut self, table: KeywordTable) -> Self {
        self.table = table;
        self
    }

    /// Currency codes marking amounts on OCR lines.
    pub fn with_currency_codes<S: AsRef<str>>(mut self, codes: &[S]) -> Result<Self> {
        self.currency_amount = currency_amount_pattern(codes)?;
        Ok(self)
    }

    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    /// When disabled, documents go straight to OCR.
    pub fn with_text_layer_enabled(mut self, enabled: bool) -> Self {
        self.text_layer_enabled = enabled;
        self
    }

    pub fn keyword_table(&self) -> &KeywordTable {
        &self.table
    }

    /// Extract transactions from one document.
    ///
    /// `source` names the document and is stamped on every record. OCR only
    /// runs when the text layer stage produced no records. Stage failures
    /// never escape; they are reported through the outcome's diagnostic.
    pub fn extract(&self, document: &[u8], source: &str) -> ExtractionOutcome {
        let mut stages = Vec::with_capacity(2);

        if self.text_layer_enabled {
            let stage = self.text_layer_stage(document, source);
            let done = !stage.is_empty();
            stages.push(stage);
            if done {
                let outcome = ExtractionOutcome::from_stages(stages);
                info!("{}: {} transactions from text layer", source, outcome.transactions.len());
                return outcome;
            }
            info!("No transactions in text layer of {}, falling back to OCR", source);
        }

        stages.push(self.ocr_stage(document, source));

        let outcome = ExtractionOutcome::from_stages(stages);
        match &outcome.diagnostic {
            Some(diagnostic) => info!("{}: {}", source, diagnostic),
            None => info!("{}: {} transactions from OCR", source, outcome.transactions.len()),
        }
        outcome
    }

    fn text_layer_stage(&self, document: &[u8], source: &str) -> StageOutcome {
        match self.text_layer.page_texts(document) {
            Ok(pages) => {
                let text = pages.join("\n");
                debug!("Text layer of {}: {} chars", source, text.len());
                let transactions = TextLineParser::new(&self.table).parse(&text, source);
                StageOutcome::succeeded(Strategy::TextLayer, transactions)
            }
            Err(e) => {
                warn!("Text layer extraction failed for {}: {}", source, e);
                StageOutcome::failed(Strategy::TextLayer, &TallyError::from(e))
            }
        }
    }

    fn ocr_stage(&self, document: &[u8], source: &str) -> StageOutcome {
        match self.ocr.page_texts(document, self.render_dpi) {
            Ok(pages) => {
                let text = pages.join("\n");
                debug!("OCR text of {}: {} chars", source, text.len());
                let transactions = OcrLineParser::new(&self.table)
                    .with_amount_pattern(&self.currency_amount)
                    .parse(&text, source);
                StageOutcome::succeeded(Strategy::Ocr, transactions)
            }
            Err(e) => {
                warn!("OCR extraction failed for {}: {}", source, e);
                StageOutcome::failed(Strategy::Ocr, &e)
            }
        }
    }
}
