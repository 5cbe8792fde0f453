//! Schema detection and projection of order exports into [`OrderLine`]s.
//!
//! Every supported export layout is described by a [`SchemaDescriptor`]. Descriptors
//! are tried in order and the first one whose required columns all appear on its
//! header row wins; supporting another marketplace means appending a descriptor.

use crate::domain::model::{
    Cell, NormalizationStats, OrderLine, OrderSource, RawSheet, NOT_AVAILABLE,
};
use crate::utils::error::{LabelError, Result, SchemaAttempt};
use std::collections::HashMap;
use std::fmt;

/// How a schema obtains the quantity of each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityRule {
    /// Numeric column; when the column is missing every row counts as one unit.
    Column(String),
    /// Every row stands for this many units.
    Fixed(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub source: OrderSource,
    /// Zero-based row holding the column names.
    pub header_row: usize,
    pub order_column: String,
    pub sku_column: String,
    pub package_column: Option<String>,
    pub tracking_column: Option<String>,
    pub quantity: QuantityRule,
}

impl SchemaDescriptor {
    pub fn required_columns(&self) -> Vec<&str> {
        vec![self.order_column.as_str(), self.sku_column.as_str()]
    }

    fn attempt(&self) -> SchemaAttempt {
        SchemaAttempt {
            tag: self.source.tag().to_string(),
            header_row: self.header_row,
            required_columns: self
                .required_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Marketplace exports supported out of the box, in detection order.
pub fn builtin_schemas() -> Vec<SchemaDescriptor> {
    vec![
        SchemaDescriptor {
            source: OrderSource::Primary,
            header_row: 0,
            order_column: "Order ID".to_string(),
            sku_column: "Seller SKU".to_string(),
            package_column: Some("Package ID".to_string()),
            tracking_column: Some("Tracking ID".to_string()),
            quantity: QuantityRule::Column("Quantity".to_string()),
        },
        // First row of this export is a title banner.
        SchemaDescriptor {
            source: OrderSource::Secondary,
            header_row: 1,
            order_column: "Número de pedido".to_string(),
            sku_column: "SKU del vendedor".to_string(),
            package_column: Some("Paquete del vendedor".to_string()),
            tracking_column: Some("Número de guía".to_string()),
            quantity: QuantityRule::Fixed(1),
        },
    ]
}

/// Why a row was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingOrderId,
    MissingSku,
    InvalidQuantity(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingOrderId => write!(f, "missing order id"),
            DropReason::MissingSku => write!(f, "missing SKU"),
            DropReason::InvalidQuantity(raw) => write!(f, "invalid quantity '{}'", raw),
        }
    }
}

/// Column positions resolved for one descriptor against one header row.
struct ColumnMap {
    order: usize,
    sku: usize,
    package: Option<usize>,
    tracking: Option<usize>,
    quantity: Option<usize>,
}

impl ColumnMap {
    fn resolve(schema: &SchemaDescriptor, headers: &[String]) -> Option<Self> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .rev() // first occurrence wins on duplicate headers
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        let lookup = |name: &Option<String>| name.as_deref().and_then(|n| index.get(n).copied());

        Some(Self {
            order: *index.get(schema.order_column.as_str())?,
            sku: *index.get(schema.sku_column.as_str())?,
            package: lookup(&schema.package_column),
            tracking: lookup(&schema.tracking_column),
            quantity: match &schema.quantity {
                QuantityRule::Column(name) => index.get(name.as_str()).copied(),
                QuantityRule::Fixed(_) => None,
            },
        })
    }
}

/// Pick the first descriptor whose required columns are present.
pub fn detect_schema<'a>(
    sheet: &RawSheet,
    schemas: &'a [SchemaDescriptor],
) -> Result<&'a SchemaDescriptor> {
    schemas
        .iter()
        .find(|schema| ColumnMap::resolve(schema, &sheet.headers(schema.header_row)).is_some())
        .ok_or_else(|| LabelError::FormatNotRecognized {
            attempted: schemas.iter().map(SchemaDescriptor::attempt).collect(),
        })
}

/// Detect the layout of `sheet` and project its rows into order lines.
pub fn normalize(
    sheet: &RawSheet,
    schemas: &[SchemaDescriptor],
) -> Result<(Vec<OrderLine>, NormalizationStats)> {
    let schema = detect_schema(sheet, schemas)?;
    let headers = sheet.headers(schema.header_row);
    let columns = ColumnMap::resolve(schema, &headers).ok_or_else(|| {
        LabelError::FormatNotRecognized {
            attempted: vec![schema.attempt()],
        }
    })?;

    tracing::info!(
        "🔍 Detected '{}' format (header on row {})",
        schema.source,
        schema.header_row + 1
    );

    let mut stats = NormalizationStats {
        detected_format: Some(schema.source.tag().to_string()),
        ..Default::default()
    };
    let mut lines = Vec::new();

    for (offset, row) in sheet.data_rows(schema.header_row).iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        stats.total_rows += 1;

        match project_row(schema, &columns, row) {
            Ok(line) => {
                stats.valid_rows += 1;
                lines.push(line);
            }
            Err(reason) => {
                // 1-based sheet row, as shown by spreadsheet programs
                let sheet_row = schema.header_row + offset + 2;
                tracing::debug!("Dropping row {}: {}", sheet_row, reason);
                stats.dropped_rows += 1;
                stats.drop_reasons.push(format!("row {}: {}", sheet_row, reason));
            }
        }
    }

    if stats.dropped_rows > 0 {
        tracing::warn!(
            "⚠️ Dropped {} of {} rows",
            stats.dropped_rows,
            stats.total_rows
        );
    }

    Ok((lines, stats))
}

fn cell_text(row: &[Cell], index: Option<usize>) -> Option<String> {
    index.and_then(|i| row.get(i)).and_then(Cell::as_text)
}

fn project_row(
    schema: &SchemaDescriptor,
    columns: &ColumnMap,
    row: &[Cell],
) -> std::result::Result<OrderLine, DropReason> {
    let order_id = cell_text(row, Some(columns.order)).ok_or(DropReason::MissingOrderId)?;
    let sku = cell_text(row, Some(columns.sku)).ok_or(DropReason::MissingSku)?;

    let quantity = match (&schema.quantity, columns.quantity) {
        (QuantityRule::Fixed(n), _) => *n,
        (QuantityRule::Column(_), None) => 1,
        (QuantityRule::Column(_), Some(i)) => {
            coerce_quantity(row.get(i).unwrap_or(&Cell::Empty))?
        }
    };

    Ok(OrderLine {
        order_id,
        package_id: cell_text(row, columns.package).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        tracking_id: cell_text(row, columns.tracking)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        sku,
        quantity,
        source: schema.source.clone(),
    })
}

/// Positive whole numbers only; `"3"`, `3` and `3.0` are all accepted.
fn coerce_quantity(cell: &Cell) -> std::result::Result<u32, DropReason> {
    let invalid = || DropReason::InvalidQuantity(cell.as_text().unwrap_or_default());

    let value = match cell {
        Cell::Int(i) => *i as f64,
        Cell::Float(f) => *f,
        Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Cell::Empty | Cell::Bool(_) => return Err(invalid()),
    };

    if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(value as u32)
}
