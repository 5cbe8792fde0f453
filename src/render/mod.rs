//! Page layout as plain data.
//!
//! Paginators produce [`Page`]s holding positioned [`DrawOp`]s; the PDF adapter turns
//! them into content streams. Keeping layout free of any PDF handle lets tests
//! inspect exactly what lands on each page.

pub mod label;
pub mod metrics;
pub mod summary;

pub use label::{paginate_labels, LabelLayout, LabelRun};
pub use metrics::{string_width, Font};
pub use summary::{build_summary, SummaryLayout};

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Millimetres to PDF points.
pub fn mm(value: f32) -> f32 {
    value * POINTS_PER_MM
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        font: Font,
        size: f32,
        x: f32,
        y: f32,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        /// Dash pattern as (on, off) lengths; solid when `None`.
        dash: Option<(f32, f32)>,
    },
}

impl DrawOp {
    pub fn text(font: Font, size: f32, x: f32, y: f32, text: impl Into<String>) -> Self {
        DrawOp::Text {
            font,
            size,
            x,
            y,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Text runs on the page, top to bottom in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Line { .. } => None,
        })
    }
}
