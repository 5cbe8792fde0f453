use serde::{Serialize, Serializer};
use std::fmt;

/// Placeholder written when a spreadsheet has no package or tracking value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Which input schema produced an order line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderSource {
    Primary,
    Secondary,
    Custom(String),
}

impl OrderSource {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "primary" => OrderSource::Primary,
            "secondary" => OrderSource::Secondary,
            other => OrderSource::Custom(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            OrderSource::Primary => "primary",
            OrderSource::Secondary => "secondary",
            OrderSource::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for OrderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for OrderSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// One spreadsheet cell after loading, independent of the file format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Text form of the cell, `None` for empty or blank cells.
    ///
    /// Integral floats drop the fraction so numeric ids survive a round trip
    /// through a spreadsheet program (`1234.0` becomes `"1234"`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", *f as i64))
            }
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

/// A worksheet as loaded: rows of cells, no header interpretation yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Header names found on `header_row`, trimmed. Empty when the row does not exist.
    pub fn headers(&self, header_row: usize) -> Vec<String> {
        self.rows
            .get(header_row)
            .map(|row| {
                row.iter()
                    .map(|c| c.as_text().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Data rows below `header_row`.
    pub fn data_rows(&self, header_row: usize) -> &[Vec<Cell>] {
        self.rows.get(header_row + 1..).unwrap_or(&[])
    }
}

/// Canonical row shared by every input schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub order_id: String,
    pub package_id: String,
    pub tracking_id: String,
    pub sku: String,
    pub quantity: u32,
    pub source: OrderSource,
}

/// Order lines sharing the same key, quantities summed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedLine {
    pub order_id: String,
    pub package_id: String,
    pub tracking_id: String,
    pub sku: String,
    pub source: OrderSource,
    pub quantity: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizationStats {
    pub detected_format: Option<String>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub dropped_rows: usize,
    pub drop_reasons: Vec<String>,
}

/// Drop hyphens and whitespace so ids printed as `JT 0123-4567` match `JT01234567`.
pub fn normalize_identifier(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// Extracted text of one page of an existing label document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub index: usize,
    pub raw_text: String,
    pub normalized_text: String,
}

impl PageRecord {
    pub fn new(index: usize, raw_text: String) -> Self {
        let normalized_text = normalize_identifier(&raw_text);
        Self {
            index,
            raw_text,
            normalized_text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub output_path: String,
    pub normalization: NormalizationStats,
    pub unique_orders: usize,
    pub label_pages: usize,
    pub summary_pages: usize,
    pub distinct_skus: usize,
    pub total_units: u64,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortStats {
    pub total_ids: usize,
    pub matched_ids: usize,
    pub missing_ids: Vec<String>,
    pub unmatched_pages: usize,
    pub emitted_pages: usize,
    pub source_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub output_path: String,
    pub stats: SortStats,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}
