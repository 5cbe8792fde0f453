use super::{mm, DrawOp, Font, Page};
use crate::core::aggregate::Aggregation;
use crate::domain::model::AggregatedLine;
use crate::render::metrics::string_width;
use std::collections::BTreeMap;

const SKU_DISPLAY_CHARS: usize = 25;
const TRACKING_FONT_SIZE: f32 = 12.0;
const ITEM_FONT_SIZE: f32 = 9.0;
const FOOTER_FONT_SIZE: f32 = 6.0;

/// Geometry of the 63mm × 38mm thermal label, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub line_height: f32,
    /// Room kept free above the bottom margin for the page footer.
    pub footer_buffer: f32,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            width: mm(63.0),
            height: mm(38.0),
            margin: mm(2.0),
            line_height: 12.0,
            footer_buffer: 5.0,
        }
    }
}

impl LabelLayout {
    pub fn printable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest baseline an item line may use.
    fn bottom_limit(&self) -> f32 {
        self.margin + self.footer_buffer
    }
}

/// Primitives of a drawn header and the baseline for the first item below it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub ops: Vec<DrawOp>,
    pub cursor: f32,
}

/// Lay out the package / tracking header of a label.
pub fn draw_header(layout: &LabelLayout, package_id: &str, tracking_id: &str) -> HeaderBlock {
    let x = layout.margin;
    let mut y = layout.height - layout.margin - 10.0;
    let mut ops = Vec::new();

    ops.push(DrawOp::text(Font::HelveticaBold, 10.0, x, y, format!("Paq: {}", package_id)));
    y -= 12.0;

    let tracking = format!("Guía: {}", tracking_id);
    let lines = wrap_tracking(
        &tracking,
        Font::HelveticaBold,
        TRACKING_FONT_SIZE,
        layout.printable_width(),
    );
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            y -= TRACKING_FONT_SIZE;
        }
        ops.push(DrawOp::text(Font::HelveticaBold, TRACKING_FONT_SIZE, x, y, line));
    }
    y -= 14.0;

    ops.push(DrawOp::text(Font::Helvetica, 8.0, x, y, "SKU / Cantidad"));
    y -= 10.0;

    HeaderBlock { ops, cursor: y }
}

/// Split `text` in two when it is wider than `max_width`.
///
/// The cut is character based: the share of characters that fit, two characters
/// earlier for slack, never before the fifth character.
pub fn wrap_tracking(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let width = string_width(text, font, size);
    let chars: Vec<char> = text.chars().collect();
    if width <= max_width || chars.len() < 2 {
        return vec![text.to_string()];
    }

    let fitting = (chars.len() as f32 * max_width / width).floor() as usize;
    let split = fitting
        .saturating_sub(2)
        .max(5)
        .min(chars.len() - 1);

    vec![
        chars[..split].iter().collect(),
        chars[split..].iter().collect(),
    ]
}

pub fn item_text(sku: &str, quantity: u64) -> String {
    let display: String = if sku.chars().count() > SKU_DISPLAY_CHARS {
        let head: String = sku.chars().take(SKU_DISPLAY_CHARS).collect();
        format!("{}..", head)
    } else {
        sku.to_string()
    };
    format!("{}  (x{})", display, quantity)
}

/// Label pages for a run plus the per-SKU totals gathered while drawing them.
#[derive(Debug, Clone, Default)]
pub struct LabelRun {
    pub pages: Vec<Page>,
    pub sku_totals: BTreeMap<String, u64>,
}

struct Paginator<'a> {
    layout: &'a LabelLayout,
    page_number: u32,
    pages: Vec<Page>,
    sku_totals: BTreeMap<String, u64>,
}

impl<'a> Paginator<'a> {
    fn open_page(&self, header: &HeaderBlock) -> Page {
        let mut page = Page::new(self.layout.width, self.layout.height);
        page.ops.extend(header.ops.iter().cloned());
        page
    }

    fn close_page(&mut self, mut page: Page, source_tag: &str) {
        let footer = format!("{} - {}", self.page_number, source_tag);
        let footer_width = string_width(&footer, Font::Helvetica, FOOTER_FONT_SIZE);
        page.ops.push(DrawOp::text(
            Font::Helvetica,
            FOOTER_FONT_SIZE,
            (self.layout.width - footer_width) / 2.0,
            self.layout.margin / 2.0,
            footer,
        ));
        self.pages.push(page);
        self.page_number += 1;
    }

    fn render_order(&mut self, lines: &[&AggregatedLine]) {
        let Some(first) = lines.first() else {
            return;
        };
        let source_tag = first.source.tag().to_string();
        let header = draw_header(self.layout, &first.package_id, &first.tracking_id);

        let mut page = self.open_page(&header);
        let mut y = header.cursor;
        let mut items_on_page = 0;

        for line in lines {
            if y < self.layout.bottom_limit() && items_on_page > 0 {
                let full = std::mem::replace(&mut page, self.open_page(&header));
                self.close_page(full, &source_tag);
                y = header.cursor;
                items_on_page = 0;
            }

            page.ops.push(DrawOp::text(
                Font::Helvetica,
                ITEM_FONT_SIZE,
                self.layout.margin,
                y,
                item_text(&line.sku, line.quantity),
            ));
            *self.sku_totals.entry(line.sku.clone()).or_default() += line.quantity;
            y -= self.layout.line_height;
            items_on_page += 1;
        }

        self.close_page(page, &source_tag);
    }
}

/// Draw one or more label pages per order, in `order_ids` order.
///
/// Page numbers run across the whole batch and every page is closed with a
/// `"<page> - <source>"` footer. Pages an order overflows onto repeat its header.
pub fn paginate_labels(order_ids: &[String], aggregation: &Aggregation, layout: &LabelLayout) -> LabelRun {
    let mut paginator = Paginator {
        layout,
        page_number: 1,
        pages: Vec::new(),
        sku_totals: BTreeMap::new(),
    };

    for order_id in order_ids {
        let lines: Vec<&AggregatedLine> = aggregation.lines_for(order_id).collect();
        if lines.is_empty() {
            tracing::warn!("Order {} has no lines, skipping label", order_id);
            continue;
        }
        paginator.render_order(&lines);
    }

    tracing::debug!(
        "Rendered {} label pages for {} orders",
        paginator.pages.len(),
        order_ids.len()
    );

    LabelRun {
        pages: paginator.pages,
        sku_totals: paginator.sku_totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::domain::model::{OrderLine, OrderSource};

    fn line(order: &str, sku: &str, quantity: u32) -> OrderLine {
        OrderLine {
            order_id: order.to_string(),
            package_id: format!("PK-{}", order),
            tracking_id: format!("TRK{}", order),
            sku: sku.to_string(),
            quantity,
            source: OrderSource::Secondary,
        }
    }

    #[test]
    fn wrap_boundary_is_exclusive() {
        let text = "Guía: JT0123456789";
        let exact = string_width(text, Font::HelveticaBold, 12.0);

        assert_eq!(wrap_tracking(text, Font::HelveticaBold, 12.0, exact), vec![text]);

        let longer = format!("{}0", text);
        let lines = wrap_tracking(&longer, Font::HelveticaBold, 12.0, exact);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.concat(), longer);

        // 19 chars at ~94.5% of the width -> floor 17, minus slack 2
        assert_eq!(lines[0].chars().count(), 15);
    }

    #[test]
    fn wrap_split_never_before_fifth_char() {
        let lines = wrap_tracking("Guía: 00000000", Font::HelveticaBold, 12.0, 10.0);
        assert_eq!(lines[0], "Guía:");
        assert_eq!(lines[1], " 00000000");
    }

    #[test]
    fn long_tracking_wraps_in_header() {
        let layout = LabelLayout::default();
        let header = draw_header(&layout, "P-1", "JT9000000000000000000042");
        let short = draw_header(&layout, "P-1", "JT42");

        assert_eq!(header.ops.len(), 4);
        assert_eq!(short.ops.len(), 3);
        assert!(header.cursor < short.cursor);
    }

    #[test]
    fn sku_lines_truncate_long_names() {
        assert_eq!(item_text("TEE-BLK-M", 2), "TEE-BLK-M  (x2)");
        assert_eq!(
            item_text("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123", 1),
            "ABCDEFGHIJKLMNOPQRSTUVWXY..  (x1)"
        );
    }

    #[test]
    fn short_order_fits_on_one_page() {
        let agg = aggregate(&[line("A", "S1", 1), line("A", "S2", 3), line("B", "S1", 2)]);
        let run = paginate_labels(&agg.order_ids, &agg, &LabelLayout::default());

        assert_eq!(run.pages.len(), 2);
        let first: Vec<&str> = run.pages[0].texts().collect();
        assert_eq!(
            first,
            vec!["Paq: PK-A", "Guía: TRKA", "SKU / Cantidad", "S1  (x1)", "S2  (x3)", "1 - secondary"]
        );
        assert_eq!(run.pages[1].texts().last(), Some("2 - secondary"));
        assert_eq!(run.sku_totals["S1"], 3);
        assert_eq!(run.sku_totals["S2"], 3);
    }

    #[test]
    fn overflowing_order_repeats_header_and_footers_once() {
        let input: Vec<OrderLine> = (0..10).map(|i| line("A", &format!("SKU{:02}", i), 1)).collect();
        let mut input = input;
        input.push(line("B", "SKU00", 5));
        let agg = aggregate(&input);

        let run = paginate_labels(&agg.order_ids, &agg, &LabelLayout::default());

        // 4 items fit under the header of a 38mm label
        assert_eq!(run.pages.len(), 4);
        for page in &run.pages[..3] {
            let texts: Vec<&str> = page.texts().collect();
            assert_eq!(&texts[..3], &["Paq: PK-A", "Guía: TRKA", "SKU / Cantidad"]);
        }
        let footers: Vec<&str> = run.pages.iter().filter_map(|p| p.texts().last()).collect();
        assert_eq!(footers, vec!["1 - secondary", "2 - secondary", "3 - secondary", "4 - secondary"]);

        // Every SKU line appears exactly once across the order's pages
        let items: Vec<&str> = run.pages[..3]
            .iter()
            .flat_map(|p| p.texts())
            .filter(|t| t.starts_with("SKU0"))
            .collect();
        assert_eq!(items.len(), 10);
        assert_eq!(run.sku_totals["SKU00"], 6);
    }

    #[test]
    fn items_stay_above_footer_area() {
        let layout = LabelLayout::default();
        let input: Vec<OrderLine> = (0..9).map(|i| line("A", &format!("S{}", i), 1)).collect();
        let agg = aggregate(&input);
        let run = paginate_labels(&agg.order_ids, &agg, &layout);

        for page in &run.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, size, .. } = op {
                    if *size == ITEM_FONT_SIZE {
                        assert!(*y >= layout.margin + layout.footer_buffer);
                    }
                }
            }
        }
    }
}
