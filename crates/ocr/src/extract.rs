use std::sync::OnceLock;

use admitscan_core::{Category, Record, Schema};
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// registration_number paternal maternal first_names folio verbal math final
// specific post_grades status
re!(re_antecedentes,
    r"^(\d{7}-\d{2})\s+([A-Z]+)\s+([A-Z]+)\s+([A-Z .]+)\s+(\d+)\s+(\d+)\s+(\d+)\s+([\d.]+)\s+(\d+)\s+([\d,]+)\s+([A-Z]+)");

// registration_number score1..score4 remarks
re!(re_conglomerado,
    r"^(\d{7})\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\w-]+)");

// ── Template registry ────────────────────────────────────────────────────────

/// A category's line grammar paired with its output schema.
pub struct Template {
    pub category: Category,
    pattern: fn() -> &'static Regex,
}

impl Template {
    pub fn pattern(&self) -> &'static Regex {
        (self.pattern)()
    }

    pub fn schema(&self) -> &'static Schema {
        self.category.schema()
    }

    /// Number of capture groups, i.e. fields per record.
    pub fn field_count(&self) -> usize {
        self.pattern().captures_len() - 1
    }

    /// Match one line (already trimmed) anchored at its start.
    pub fn parse_line(&self, line: &str) -> Option<Record> {
        let caps = self.pattern().captures(line)?;
        let fields = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        Some(Record::new(fields))
    }
}

static ANTECEDENTES: Template = Template { category: Category::Antecedentes, pattern: re_antecedentes };
static CONGLOMERADO: Template = Template { category: Category::Conglomerado, pattern: re_conglomerado };

/// Look up the template registered for `category`.
pub fn template(category: Category) -> &'static Template {
    match category {
        Category::Antecedentes => &ANTECEDENTES,
        Category::Conglomerado => &CONGLOMERADO,
    }
}

/// Every registered template, in batch order.
pub fn templates() -> impl Iterator<Item = &'static Template> {
    Category::ALL.into_iter().map(template)
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Parse every line of recognized text with the category's grammar.
    /// Lines that do not match contribute nothing.
    pub fn extract(ocr_text: &str, category: Category) -> Vec<Record> {
        let template = template(category);
        ocr_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter_map(|l| template.parse_line(l))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
