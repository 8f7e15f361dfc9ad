use std::path::PathBuf;

use admitscan::BatchRunner;
use admitscan_core::{EmptyTablePolicy, PipelineConfig, RecognizerBackend};
use admitscan_ocr::{build_backend, DocumentPipeline, FsSink, OcrBackend};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Extract admissions tables from scanned Antecedentes / Conglomerado pages.
#[derive(Debug, Parser)]
#[command(name = "admitscan", version)]
struct Cli {
    /// Root containing the `Antecedentes/` and `Conglomerado/` folders.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Where CSV tables are written (default: `<data-dir>/output`).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Where diagnostic images, raw OCR text and the run report go.
    #[arg(long, default_value = "logs")]
    logs_dir: PathBuf,

    /// TOML file with pipeline settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recognizer backend: `cli` or `leptess`.
    #[arg(long)]
    backend: Option<RecognizerBackend>,

    /// Path to the tesseract executable.
    #[arg(long)]
    tesseract_cmd: Option<PathBuf>,

    /// Recognition language code.
    #[arg(long)]
    lang: Option<String>,

    /// What to do when an image yields no records: `skip` or `header-only`.
    #[arg(long)]
    empty_tables: Option<EmptyTablePolicy>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(backend) = self.backend {
            config.recognition.backend = backend;
        }
        if let Some(cmd) = &self.tesseract_cmd {
            config.recognition.command = cmd.clone();
        }
        if let Some(lang) = &self.lang {
            config.recognition.language = lang.clone();
        }
        if let Some(policy) = self.empty_tables {
            config.output.empty_tables = policy;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "admitscan=debug" } else { "admitscan=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.pipeline_config()?;
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| cli.data_dir.join("output"));

    let recognizer = build_backend(&config.recognition).context("initializing OCR backend")?;
    tracing::info!(
        backend = recognizer.name(),
        language = %config.recognition.language,
        "Recognizer ready"
    );

    let pipeline = DocumentPipeline::new(recognizer, config.normalize.clone())
        .with_sink(FsSink::new(&cli.logs_dir));
    let runner = BatchRunner::new(pipeline, config.output.clone());

    let report = runner.run(&cli.data_dir, &output_dir, &cli.logs_dir).await?;
    let summary = report.summary();
    println!(
        "{} table(s) written, {} image(s) without structured data, {} failed",
        summary.written, summary.no_structured_data, summary.failed
    );
    Ok(())
}
