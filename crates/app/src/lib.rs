pub mod batch;
pub mod report;

pub use batch::{list_images, BatchRunner, REPORT_FILE_NAME};
pub use report::{ImageOutcome, ImageReport, RunReport, Summary};
