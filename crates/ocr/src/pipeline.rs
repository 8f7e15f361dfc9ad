use admitscan_core::{Category, NormalizeConfig, Record};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::diagnostics::{DiagnosticsError, DiagnosticsSink, NoopSink};
use crate::extract::Extractor;
use crate::hash;
use crate::preprocess::{Normalizer, PreprocessError};
use crate::recognizer::{OcrBackend, OcrError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

impl PipelineError {
    /// The pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Io(_) => "read",
            PipelineError::Preprocess(_) => "normalize",
            PipelineError::Ocr(_) => "recognize",
        }
    }
}

/// The result of running one document image through the pipeline.
#[derive(Debug)]
pub struct DocumentResult {
    pub file_name: String,
    pub category: Category,
    /// SHA-256 hex digest of the source image bytes.
    pub digest: String,
    /// Raw OCR text output.
    pub ocr_text: String,
    /// Records parsed from the text, in line order.
    pub records: Vec<Record>,
}

/// Orchestrates: decode → normalize → recognize → extract, emitting
/// intermediates to the diagnostics sink along the way.
pub struct DocumentPipeline<R: OcrBackend> {
    normalizer: Normalizer,
    recognizer: R,
    sink: Box<dyn DiagnosticsSink>,
}

impl<R: OcrBackend> DocumentPipeline<R> {
    pub fn new(recognizer: R, config: NormalizeConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
            recognizer,
            sink: Box::new(NoopSink),
        }
    }

    pub fn with_sink(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Process a file on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        category: Category,
    ) -> Result<DocumentResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.process_bytes(&bytes, &file_name, category)
    }

    /// Process raw encoded image bytes.
    pub fn process_bytes(
        &self,
        data: &[u8],
        file_name: &str,
        category: Category,
    ) -> Result<DocumentResult, PipelineError> {
        let digest = hash::content_digest(data);

        let normalized = self.normalizer.normalize_bytes(data)?;
        report(file_name, self.sink.grayscale(file_name, &normalized.grayscale));
        report(file_name, self.sink.binary(file_name, &normalized.binary));

        let ocr_text = self.recognizer.recognize(&normalized.binary)?;
        report(file_name, self.sink.recognized_text(file_name, &ocr_text));

        let records = Extractor::extract(&ocr_text, category);
        info!(
            file = file_name,
            %category,
            lines = ocr_text.lines().count(),
            records = records.len(),
            "extracted records"
        );

        Ok(DocumentResult {
            file_name: file_name.to_string(),
            category,
            digest,
            ocr_text,
            records,
        })
    }
}

fn report(file_name: &str, result: Result<(), DiagnosticsError>) {
    if let Err(e) = result {
        warn!(file = file_name, "Failed to write diagnostic artifact: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
