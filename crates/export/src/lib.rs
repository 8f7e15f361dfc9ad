pub mod csv;

pub use crate::csv::{output_file_name, to_csv_bytes, write_records, write_table, ExportError};
