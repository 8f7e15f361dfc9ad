use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the known document templates. Each category selects both the line
/// grammar used during extraction and the column schema used on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Antecedentes,
    Conglomerado,
}

impl Category {
    /// Processing order for a batch run.
    pub const ALL: [Category; 2] = [Category::Antecedentes, Category::Conglomerado];

    /// Directory name and file-name suffix used for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Antecedentes => "Antecedentes",
            Category::Conglomerado => "Conglomerado",
        }
    }

    /// Output column schema for this category.
    pub fn schema(self) -> &'static Schema {
        match self {
            Category::Antecedentes => &ANTECEDENTES,
            Category::Conglomerado => &CONGLOMERADO,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category: '{s}'"))
    }
}

/// The fixed, ordered set of named columns a category's table must have.
#[derive(Debug)]
pub struct Schema {
    pub category: Category,
    pub columns: &'static [&'static str],
}

impl Schema {
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

static ANTECEDENTES: Schema = Schema {
    category: Category::Antecedentes,
    columns: &[
        "Registration Number",
        "Last Name (Paternal)",
        "Last Name (Maternal)",
        "First Name(s)",
        "Folio Number",
        "Verbal Score",
        "Math Score",
        "Final Score",
        "Specific Tests",
        "Post Grades",
        "Admission Status",
    ],
};

static CONGLOMERADO: Schema = Schema {
    category: Category::Conglomerado,
    columns: &[
        "Registration Number",
        "Score 1",
        "Score 2",
        "Score 3",
        "Score 4",
        "Remarks",
    ],
};
