use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters for the grayscale → CLAHE → adaptive threshold chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Histogram clip limit, relative to a uniform distribution.
    pub clip_limit: f32,
    /// Number of tiles along each axis.
    pub tile_grid: u32,
    /// Gaussian neighbourhood width for the local mean (odd).
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub offset: i32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { clip_limit: 2.0, tile_grid: 8, block_size: 31, offset: 8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognizerBackend {
    /// Spawn the tesseract executable.
    #[default]
    Cli,
    /// Link libtesseract in-process (requires the `tesseract` feature).
    Leptess,
}

impl std::str::FromStr for RecognizerBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cli" => Ok(RecognizerBackend::Cli),
            "leptess" => Ok(RecognizerBackend::Leptess),
            other => Err(format!("Unknown recognizer backend: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub backend: RecognizerBackend,
    /// Path or name of the tesseract executable.
    pub command: PathBuf,
    pub language: String,
    /// 6 = assume a single uniform block of text.
    pub page_segmentation_mode: u8,
    /// 3 = default engine (LSTM where available).
    pub engine_mode: u8,
    /// Optional tessdata directory.
    pub data_path: Option<PathBuf>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend: RecognizerBackend::Cli,
            command: PathBuf::from("tesseract"),
            language: "spa".to_string(),
            page_segmentation_mode: 6,
            engine_mode: 3,
            data_path: None,
        }
    }
}

/// What to do with an image whose text produced no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyTablePolicy {
    /// Write nothing; only report the image.
    #[default]
    Skip,
    /// Write a CSV containing only the header row.
    HeaderOnly,
}

impl std::str::FromStr for EmptyTablePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(EmptyTablePolicy::Skip),
            "header-only" => Ok(EmptyTablePolicy::HeaderOnly),
            other => Err(format!("Unknown empty-table policy: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub empty_tables: EmptyTablePolicy,
    /// Accepted image extensions, compared case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            empty_tables: EmptyTablePolicy::Skip,
            extensions: vec!["jpg".to_string(), "png".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub normalize: NormalizeConfig,
    pub recognition: RecognitionConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = &self.normalize;
        if n.block_size < 3 || n.block_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "normalize.block_size must be odd and >= 3, got {}",
                n.block_size
            )));
        }
        if n.tile_grid == 0 {
            return Err(ConfigError::Invalid("normalize.tile_grid must be > 0".into()));
        }
        if !(n.clip_limit > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "normalize.clip_limit must be positive, got {}",
                n.clip_limit
            )));
        }
        if self.recognition.language.trim().is_empty() {
            return Err(ConfigError::Invalid("recognition.language is empty".into()));
        }
        Ok(())
    }
}
