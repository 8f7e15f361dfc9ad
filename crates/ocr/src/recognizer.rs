use admitscan_core::{RecognitionConfig, RecognizerBackend};
use image::GrayImage;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

use crate::preprocess;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),
    #[error("IO error talking to OCR engine: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over a text-recognition engine.
/// Implementations take the binarized page and return raw multi-line text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;

    fn name(&self) -> &'static str;
}

impl OcrBackend for Box<dyn OcrBackend> {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the backend selected in the recognition config.
pub fn build_backend(config: &RecognitionConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    match config.backend {
        RecognizerBackend::Cli => Ok(Box::new(TesseractCli::from_config(config))),
        #[cfg(feature = "tesseract")]
        RecognizerBackend::Leptess => Ok(Box::new(
            tesseract_backend::TesseractRecognizer::from_config(config),
        )),
        #[cfg(not(feature = "tesseract"))]
        RecognizerBackend::Leptess => Err(OcrError::NotAvailable(
            "leptess backend requires building with the `tesseract` feature".to_string(),
        )),
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string — useful for unit testing the extraction pipeline
/// without requiring Tesseract to be installed.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ── Tesseract executable backend ──────────────────────────────────────────────

/// Runs `tesseract stdin stdout` with the page piped in as PNG.
pub struct TesseractCli {
    command: PathBuf,
    language: String,
    page_segmentation_mode: u8,
    engine_mode: u8,
    data_path: Option<PathBuf>,
}

impl TesseractCli {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
            engine_mode: config.engine_mode,
            data_path: config.data_path.clone(),
        }
    }

    /// Arguments after the executable name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
            "--oem".to_string(),
            self.engine_mode.to_string(),
        ];
        if let Some(dir) = &self.data_path {
            args.push("--tessdata-dir".to_string());
            args.push(dir.display().to_string());
        }
        args
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let png = preprocess::encode_png(image).map_err(|e| OcrError::ImageDecode(e.to_string()))?;
        let args = self.args();
        debug!(command = %self.command.display(), ?args, "invoking tesseract");

        let mut child = match Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::NotAvailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.command.display()
                )));
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        // An engine that dies early (e.g. missing language data) closes stdin
        // before the page is written; its exit status and stderr still win.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        written?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "tesseract-cli"
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use admitscan_core::RecognitionConfig;
    use image::GrayImage;
    use leptess::{LepTess, Variable};

    /// In-process libtesseract. The engine mode is whatever the library
    /// initialises with (the default/LSTM engine).
    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
        page_segmentation_mode: u8,
    }

    impl TesseractRecognizer {
        pub fn from_config(config: &RecognitionConfig) -> Self {
            Self {
                data_path: config.data_path.as_ref().map(|p| p.display().to_string()),
                lang: config.language.clone(),
                page_segmentation_mode: config.page_segmentation_mode,
            }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
            let png = crate::preprocess::encode_png(image)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(
                Variable::TesseditPagesegMode,
                &self.page_segmentation_mode.to_string(),
            )
            .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }

        fn name(&self) -> &'static str {
            "leptess"
        }
    }
}
