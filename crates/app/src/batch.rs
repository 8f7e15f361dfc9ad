use admitscan_core::{Category, EmptyTablePolicy, OutputConfig, Table};
use admitscan_export::{output_file_name, write_records, write_table};
use admitscan_ocr::{DocumentPipeline, OcrBackend};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::report::{ImageOutcome, ImageReport, RunReport};

pub const REPORT_FILE_NAME: &str = "run_report.json";

/// Drives every categorized input image through the pipeline, one at a time.
pub struct BatchRunner<R: OcrBackend> {
    pipeline: DocumentPipeline<R>,
    output: OutputConfig,
}

impl<R: OcrBackend> BatchRunner<R> {
    pub fn new(pipeline: DocumentPipeline<R>, output: OutputConfig) -> Self {
        Self { pipeline, output }
    }

    /// Process `<input_root>/<Category>/*.{jpg,png}` into
    /// `<output_root>/<stem>_<Category>.csv`. Per-image failures are recorded
    /// in the report; an unreadable input root or failing to create the
    /// output or log directory is fatal.
    pub async fn run(
        &self,
        input_root: &Path,
        output_root: &Path,
        log_root: &Path,
    ) -> anyhow::Result<RunReport> {
        // Checked before creating anything: the output root usually lives
        // inside the input root.
        tokio::fs::read_dir(input_root)
            .await
            .with_context(|| format!("reading input directory {}", input_root.display()))?;

        tokio::fs::create_dir_all(output_root)
            .await
            .with_context(|| format!("creating output directory {}", output_root.display()))?;
        tokio::fs::create_dir_all(log_root)
            .await
            .with_context(|| format!("creating log directory {}", log_root.display()))?;

        let mut report = RunReport::new(input_root, output_root);

        for category in Category::ALL {
            let folder = input_root.join(category.as_str());
            let images = match list_images(&folder, &self.output.extensions).await {
                Ok(images) => images,
                Err(e) => {
                    warn!("Skipping {category}: cannot read {}: {e}", folder.display());
                    continue;
                }
            };

            for path in images {
                let image = self.process_image(&path, category, output_root).await;
                report.push(image);
            }
        }

        report.finish();
        let summary = report.summary();
        info!(
            written = summary.written,
            no_structured_data = summary.no_structured_data,
            failed = summary.failed,
            "Batch complete"
        );

        let report_path = log_root.join(REPORT_FILE_NAME);
        if let Err(e) = report.write(&report_path) {
            warn!("Failed to write run report {}: {e}", report_path.display());
        }

        Ok(report)
    }

    async fn process_image(&self, path: &Path, category: Category, output_root: &Path) -> ImageReport {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Processing {category} file: {file_name}");

        let doc = match self.pipeline.process_file(path, category).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Skipping {file_name}: {e}");
                return ImageReport {
                    source: path.to_path_buf(),
                    category,
                    digest: None,
                    outcome: ImageOutcome::Failed { stage: e.stage().to_string(), error: e.to_string() },
                };
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let destination = output_root.join(output_file_name(&stem, category));

        let outcome = if doc.records.is_empty() {
            warn!("No structured data extracted for {file_name}. Check logs.");
            match self.output.empty_tables {
                EmptyTablePolicy::Skip => ImageOutcome::NoStructuredData { csv: None },
                EmptyTablePolicy::HeaderOnly => {
                    let table = Table::from_records(category.schema(), Vec::new());
                    match write_table(&table, &destination) {
                        Ok(()) => ImageOutcome::NoStructuredData { csv: Some(destination) },
                        Err(e) => write_failed(&file_name, e),
                    }
                }
            }
        } else {
            match write_records(doc.records, category, &destination) {
                Ok(table) => ImageOutcome::Written { csv: destination, rows: table.rows().len() },
                Err(e) => write_failed(&file_name, e),
            }
        };

        ImageReport {
            source: path.to_path_buf(),
            category,
            digest: Some(doc.digest),
            outcome,
        }
    }
}

fn write_failed(file_name: &str, e: admitscan_export::ExportError) -> ImageOutcome {
    warn!("Failed to write table for {file_name}: {e}");
    ImageOutcome::Failed { stage: "write".to_string(), error: e.to_string() }
}

/// Regular files in `dir` whose extension is in `extensions`
/// (case-insensitive), sorted by file name.
pub async fn list_images(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if accepted {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        OutputConfig::default().extensions
    }

    #[tokio::test]
    async fn list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.txt", "d.jpeg", "e.jpg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let found = list_images(dir.path(), &exts()).await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "e.jpg"]);
    }

    #[tokio::test]
    async fn list_images_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_images(&dir.path().join("Antecedentes"), &exts()).await.is_err());
    }
}
