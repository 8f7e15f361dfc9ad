pub mod diagnostics;
pub mod extract;
pub mod hash;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;

pub use diagnostics::{DiagnosticsError, DiagnosticsSink, FsSink, NoopSink};
pub use extract::{template, templates, Extractor, Template};
pub use hash::content_digest;
pub use pipeline::{DocumentPipeline, DocumentResult, PipelineError};
pub use preprocess::{Normalized, Normalizer, PreprocessError};
pub use recognizer::{build_backend, MockRecognizer, OcrBackend, OcrError, TesseractCli};
