use admitscan_core::Category;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What happened to a single input image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImageOutcome {
    Written { csv: PathBuf, rows: usize },
    /// Zero records matched. `csv` is set when a header-only table was written.
    NoStructuredData { csv: Option<PathBuf> },
    Failed { stage: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub source: PathBuf,
    pub category: Category,
    /// SHA-256 of the source bytes, when the file could be read.
    pub digest: Option<String>,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub images: Vec<ImageReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub written: usize,
    pub no_structured_data: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn new(input_root: &Path, output_root: &Path) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            images: Vec::new(),
        }
    }

    pub fn push(&mut self, image: ImageReport) {
        self.images.push(image);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn summary(&self) -> Summary {
        self.images.iter().fold(Summary::default(), |mut s, img| {
            match img.outcome {
                ImageOutcome::Written { .. } => s.written += 1,
                ImageOutcome::NoStructuredData { .. } => s.no_structured_data += 1,
                ImageOutcome::Failed { .. } => s.failed += 1,
            }
            s
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let mut r = RunReport::new(Path::new("data"), Path::new("data/output"));
        r.push(ImageReport {
            source: PathBuf::from("data/Conglomerado/a.png"),
            category: Category::Conglomerado,
            digest: Some("ab".repeat(32)),
            outcome: ImageOutcome::Written { csv: PathBuf::from("data/output/a_Conglomerado.csv"), rows: 3 },
        });
        r.push(ImageReport {
            source: PathBuf::from("data/Conglomerado/b.png"),
            category: Category::Conglomerado,
            digest: Some("cd".repeat(32)),
            outcome: ImageOutcome::NoStructuredData { csv: None },
        });
        r.push(ImageReport {
            source: PathBuf::from("data/Antecedentes/c.jpg"),
            category: Category::Antecedentes,
            digest: None,
            outcome: ImageOutcome::Failed { stage: "normalize".into(), error: "bad".into() },
        });
        r
    }

    #[test]
    fn summary_counts_outcomes() {
        assert_eq!(
            report().summary(),
            Summary { written: 1, no_structured_data: 1, failed: 1 }
        );
    }

    #[test]
    fn json_flattens_outcome() {
        let mut r = report();
        r.finish();
        let v: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        let images = v["images"].as_array().unwrap();
        assert_eq!(images[0]["outcome"], "written");
        assert_eq!(images[0]["rows"], 3);
        assert_eq!(images[0]["category"], "Conglomerado");
        assert_eq!(images[1]["outcome"], "no_structured_data");
        assert_eq!(images[2]["stage"], "normalize");
        assert!(v["finished_at"].is_string());
    }
}
