use image::GrayImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to save image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Receives intermediate artifacts from the pipeline, keyed by the source
/// image's file name.
pub trait DiagnosticsSink: Send + Sync {
    fn grayscale(&self, _file_name: &str, _image: &GrayImage) -> Result<(), DiagnosticsError> {
        Ok(())
    }

    fn binary(&self, _file_name: &str, _image: &GrayImage) -> Result<(), DiagnosticsError> {
        Ok(())
    }

    fn recognized_text(&self, _file_name: &str, _text: &str) -> Result<(), DiagnosticsError> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {}

/// Writes artifacts into a logs directory:
/// `grayscale_<file>`, `preprocessed_<file>` and `ocr_output_<file>.txt`.
#[derive(Debug, Clone)]
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn grayscale_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("grayscale_{file_name}"))
    }

    pub fn binary_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("preprocessed_{file_name}"))
    }

    pub fn text_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("ocr_output_{file_name}.txt"))
    }

    fn save_image(&self, path: PathBuf, image: &GrayImage) -> Result<(), DiagnosticsError> {
        std::fs::create_dir_all(&self.dir)?;
        image
            .save(&path)
            .map_err(|source| DiagnosticsError::Image { path: path.clone(), source })?;
        info!("Saved diagnostic image: {}", path.display());
        Ok(())
    }
}

impl DiagnosticsSink for FsSink {
    fn grayscale(&self, file_name: &str, image: &GrayImage) -> Result<(), DiagnosticsError> {
        self.save_image(self.grayscale_path(file_name), image)
    }

    fn binary(&self, file_name: &str, image: &GrayImage) -> Result<(), DiagnosticsError> {
        self.save_image(self.binary_path(file_name), image)
    }

    fn recognized_text(&self, file_name: &str, text: &str) -> Result<(), DiagnosticsError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.text_path(file_name);
        std::fs::write(&path, text)?;
        info!("Saved OCR output to: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn checker() -> GrayImage {
        ImageBuffer::from_fn(8, 8, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 255 }]))
    }

    #[test]
    fn noop_accepts_everything() {
        let sink = NoopSink;
        assert!(sink.grayscale("a.png", &checker()).is_ok());
        assert!(sink.binary("a.png", &checker()).is_ok());
        assert!(sink.recognized_text("a.png", "text").is_ok());
    }

    #[test]
    fn fs_sink_writes_named_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let sink = FsSink::new(&logs);

        sink.grayscale("scan_01.png", &checker()).unwrap();
        sink.binary("scan_01.png", &checker()).unwrap();
        sink.recognized_text("scan_01.png", "1234567 1.0 2.0 3.0 4.0 OK\n").unwrap();

        assert!(logs.join("grayscale_scan_01.png").exists());
        assert!(logs.join("preprocessed_scan_01.png").exists());
        let text = std::fs::read_to_string(logs.join("ocr_output_scan_01.png.txt")).unwrap();
        assert_eq!(text, "1234567 1.0 2.0 3.0 4.0 OK\n");

        let reloaded = image::open(logs.join("preprocessed_scan_01.png")).unwrap().to_luma8();
        assert_eq!(reloaded, checker());
    }

    #[test]
    fn fs_sink_reports_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(dir.path());
        let r = sink.binary("scan.unknownext", &checker());
        assert!(matches!(r, Err(DiagnosticsError::Image { .. })));
    }
}
