use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Separator placed between the items of a joined text block.
pub const BLOCK_SEPARATOR: &str = ",\n";
/// Text written in place of an empty matched-value block.
pub const NO_MATCH: &str = "No Match";

/// Identifiers extracted from one report definition.
///
/// Every entry is normalized with [`normalize_identifier`] and kept in the
/// order it appeared in the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReport {
    pub field_identifiers: Vec<String>,
    pub filter_expressions: Vec<String>,
    pub data_sources: Vec<String>,
}

impl ExtractedReport {
    /// Creates a report that only carries field identifiers.
    pub fn with_fields(field_identifiers: Vec<String>) -> Self {
        Self {
            field_identifiers,
            ..Self::default()
        }
    }
}

/// Overlap between two [`ExtractedReport`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched_field_identifiers: BTreeSet<String>,
    pub field_match_percent: f64,
    pub matched_filters: BTreeSet<String>,
    pub filter_match_percent: f64,
    pub matched_sources: BTreeSet<String>,
    pub source_match_percent: f64,
    pub overall_percent: f64,
}

/// One row of the detail sheet, describing a single input report.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub name: String,
    pub path: String,
    pub field_identifiers: String,
    pub data_sources: String,
    pub filter_expressions: String,
}

impl DetailRow {
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::text(&self.name),
            CellValue::text(&self.path),
            CellValue::text(&self.field_identifiers),
            CellValue::text(&self.data_sources),
            CellValue::text(&self.filter_expressions),
        ]
    }
}

/// One row of the summary sheet, describing a compared pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub combined_name: String,
    pub matched_fields: String,
    pub field_match_percent: f64,
    pub matched_filters: String,
    pub filter_match_percent: f64,
    pub matched_sources: String,
    pub source_match_percent: f64,
    pub overall_percent: f64,
}

impl SummaryRow {
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::text(&self.combined_name),
            CellValue::text(&self.matched_fields),
            CellValue::Number(self.field_match_percent),
            CellValue::text(&self.matched_filters),
            CellValue::Number(self.filter_match_percent),
            CellValue::text(&self.matched_sources),
            CellValue::Number(self.source_match_percent),
            CellValue::Number(self.overall_percent),
        ]
    }
}

/// Value stored in a workbook cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Text rendering used for display and column sizing. Empty cells render
    /// as an empty string.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// True when the value is text spanning more than one line.
    pub fn is_multiline(&self) -> bool {
        matches!(self, CellValue::Text(value) if value.contains('\n'))
    }

    /// Length, in characters, of the longest line of the rendered value.
    pub fn longest_line(&self) -> usize {
        self.display()
            .split('\n')
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
    }
}

/// Removes every double quote and lower-cases the remainder.
pub fn normalize_identifier(raw: &str) -> String {
    raw.replace('"', "").to_lowercase()
}

/// Joins items into a multi-line text block, keeping their order.
pub fn join_block<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
