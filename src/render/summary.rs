use super::{mm, DrawOp, Font, Page};
use crate::render::metrics::string_width;
use std::collections::BTreeMap;

pub const DEFAULT_SUMMARY_TITLE: &str = "Lista de Picking (Resumen de SKUs)";
const ROW_FONT_SIZE: f32 = 10.0;

/// A4 picking list geometry, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLayout {
    pub width: f32,
    pub height: f32,
    pub left: f32,
    pub quantity_column: f32,
    /// Where the dotted connector between SKU and quantity ends.
    pub connector_end: f32,
    pub rule_end: f32,
    pub bottom: f32,
    pub row_height: f32,
}

impl Default for SummaryLayout {
    fn default() -> Self {
        Self {
            width: mm(210.0),
            height: mm(297.0),
            left: mm(20.0),
            quantity_column: mm(120.0),
            connector_end: mm(115.0),
            rule_end: mm(180.0),
            bottom: mm(20.0),
            row_height: mm(10.0),
        }
    }
}

/// Render the SKU totals as one or more A4 pages, SKUs in ascending order.
///
/// Only the first page carries the title and column headings; continuation pages
/// start straight with rows.
pub fn build_summary(totals: &BTreeMap<String, u64>, title: &str, layout: &SummaryLayout) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut page = Page::new(layout.width, layout.height);

    page.ops.push(DrawOp::text(
        Font::HelveticaBold,
        14.0,
        layout.left,
        layout.height - mm(20.0),
        title,
    ));

    let mut y = layout.height - mm(30.0);
    page.ops.push(DrawOp::text(Font::HelveticaBold, 10.0, layout.left, y, "SKU del Vendedor"));
    page.ops.push(DrawOp::text(
        Font::HelveticaBold,
        10.0,
        layout.quantity_column,
        y,
        "Cantidad Total",
    ));
    y -= mm(5.0);
    page.ops.push(DrawOp::Line {
        from: (layout.left, y),
        to: (layout.rule_end, y),
        dash: None,
    });
    y -= mm(5.0);

    for (sku, total) in totals {
        if y < layout.bottom {
            pages.push(std::mem::replace(&mut page, Page::new(layout.width, layout.height)));
            y = layout.height - mm(20.0);
        }

        page.ops.push(DrawOp::text(Font::Helvetica, ROW_FONT_SIZE, layout.left, y, sku.as_str()));

        let connector_start = layout.left + string_width(sku, Font::Helvetica, ROW_FONT_SIZE) + mm(2.0);
        if connector_start < layout.connector_end {
            page.ops.push(DrawOp::Line {
                from: (connector_start, y + 1.5),
                to: (layout.connector_end, y + 1.5),
                dash: Some((1.0, 3.0)),
            });
        }

        page.ops.push(DrawOp::text(
            Font::Helvetica,
            ROW_FONT_SIZE,
            layout.quantity_column,
            y,
            total.to_string(),
        ));
        y -= layout.row_height;
    }

    pages.push(page);
    tracing::debug!("Rendered {} summary pages for {} SKUs", pages.len(), totals.len());
    pages
}
