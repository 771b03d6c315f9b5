//! Record shapes flowing through an import run.
//!
//! `RawRecord` lives only while a source file is parsed, `FountainRecord` only
//! while rows are transformed and written. `PersistedFountain` is what the
//! store hands back after an insert.

use indexmap::IndexMap;
use serde::Serialize;

/// A single primitive cell as produced by the CSV or workbook parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Build a text cell, folding the empty string into `Empty`.
    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self::Empty
        } else {
            Self::Text(raw)
        }
    }

    /// Cell rendered as text. Numbers use their shortest form (`9`, `8.5`).
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }

    /// Trimmed text, or `None` when the cell is blank.
    pub fn non_blank(&self) -> Option<String> {
        let text = self.as_text();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

impl From<&str> for CellValue {
    fn from(raw: &str) -> Self {
        Self::text(raw)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Header-keyed row in source column order. Header names are kept verbatim.
pub type RawRecord = IndexMap<String, CellValue>;

/// Normalized, store-ready fountain row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FountainRecord {
    pub number: String,
    pub location: String,
    pub description: String,
    pub flavor_description: String,
    /// Source rating text, trimmed but otherwise untouched.
    pub flavor_rating: String,
    pub images: Vec<String>,
    pub other: String,
    pub video: String,
}

/// A fountain row after insert, carrying the store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedFountain {
    pub id: i64,
    #[serde(flatten)]
    pub record: FountainRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_like_spreadsheet_text() {
        assert_eq!(CellValue::Number(9.0).as_text(), "9");
        assert_eq!(CellValue::Number(8.5).as_text(), "8.5");
    }

    #[test]
    fn blank_cells_have_no_value() {
        assert_eq!(CellValue::text(""), CellValue::Empty);
        assert_eq!(CellValue::text("   ").non_blank(), None);
        assert_eq!(CellValue::Empty.non_blank(), None);
        assert_eq!(CellValue::text(" 2B ").non_blank().as_deref(), Some("2B"));
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let rec = FountainRecord {
            number: "#9".into(),
            flavor_rating: "B+".into(),
            ..FountainRecord::default()
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["flavorRating"], "B+");
        assert!(v.get("flavorDescription").is_some());
    }
}
