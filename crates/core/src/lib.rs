pub mod category;
pub mod config;
pub mod record;

pub use category::{Category, Schema};
pub use config::{
    ConfigError, EmptyTablePolicy, NormalizeConfig, OutputConfig, PipelineConfig,
    RecognitionConfig, RecognizerBackend,
};
pub use record::{Record, Table};
