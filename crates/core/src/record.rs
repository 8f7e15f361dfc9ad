use serde::{Deserialize, Serialize};

use crate::category::Schema;

/// One structured tuple of fields captured from a single recognized line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }
}

/// Rows for one document, each exactly `schema.width()` columns wide.
#[derive(Debug, Clone)]
pub struct Table {
    schema: &'static Schema,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a rectangular table: short records are padded with empty strings,
    /// long records are truncated to the schema width.
    pub fn from_records(schema: &'static Schema, records: Vec<Record>) -> Self {
        let width = schema.width();
        let rows = records
            .into_iter()
            .map(|r| {
                let mut row = r.fields;
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { schema, rows }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn headers(&self) -> &'static [&'static str] {
        self.schema.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
