use crate::adapters::pdf::render_document;
use crate::adapters::spreadsheet::load_sheet;
use crate::core::aggregate::aggregate;
use crate::core::normalize::{builtin_schemas, normalize, SchemaDescriptor};
use crate::domain::model::{GenerationReport, NormalizationStats, RawSheet};
use crate::domain::ports::{Pipeline, Storage};
use crate::render::summary::DEFAULT_SUMMARY_TITLE;
use crate::render::{build_summary, paginate_labels, LabelLayout, SummaryLayout};
use crate::utils::error::{LabelError, Result};
use async_trait::async_trait;

/// Rendered document plus everything the report needs.
#[derive(Debug)]
pub struct LabelDocument {
    pub bytes: Vec<u8>,
    pub normalization: NormalizationStats,
    pub unique_orders: usize,
    pub label_pages: usize,
    pub summary_pages: usize,
    pub distinct_skus: usize,
    pub total_units: u64,
}

/// Orders spreadsheet → label pages followed by the picking summary.
pub struct LabelPipeline<S: Storage> {
    storage: S,
    input: String,
    output: String,
    schemas: Vec<SchemaDescriptor>,
    summary_title: String,
    label_layout: LabelLayout,
    summary_layout: SummaryLayout,
}

impl<S: Storage> LabelPipeline<S> {
    pub fn new(storage: S, input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            storage,
            input: input.into(),
            output: output.into(),
            schemas: builtin_schemas(),
            summary_title: DEFAULT_SUMMARY_TITLE.to_string(),
            label_layout: LabelLayout::default(),
            summary_layout: SummaryLayout::default(),
        }
    }

    pub fn with_schemas(mut self, schemas: Vec<SchemaDescriptor>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_summary_title(mut self, title: impl Into<String>) -> Self {
        self.summary_title = title.into();
        self
    }
}

#[async_trait]
impl<S: Storage> Pipeline for LabelPipeline<S> {
    type Extracted = RawSheet;
    type Transformed = LabelDocument;
    type Report = GenerationReport;

    fn name(&self) -> &'static str {
        "generate-labels"
    }

    async fn extract(&self) -> Result<RawSheet> {
        tracing::debug!("Reading orders from {}", self.input);
        let bytes = self.storage.read_file(&self.input).await.map_err(|e| {
            LabelError::SpreadsheetReadFailure {
                path: self.input.clone(),
                message: e.to_string(),
            }
        })?;

        load_sheet(&self.input, bytes)
    }

    async fn transform(&self, sheet: RawSheet) -> Result<LabelDocument> {
        let (lines, normalization) = normalize(&sheet, &self.schemas)?;
        tracing::info!(
            "📋 {} of {} rows usable",
            normalization.valid_rows,
            normalization.total_rows
        );

        let aggregation = aggregate(&lines);
        if aggregation.order_ids.is_empty() {
            tracing::warn!("⚠️ No orders to label, only the summary page will be written");
        }

        let run = paginate_labels(&aggregation.order_ids, &aggregation, &self.label_layout);
        let summary = build_summary(&run.sku_totals, &self.summary_title, &self.summary_layout);
        tracing::info!(
            "🏷️ {} label pages for {} orders, {} summary pages",
            run.pages.len(),
            aggregation.order_ids.len(),
            summary.len()
        );

        let label_pages = run.pages.len();
        let summary_pages = summary.len();
        let mut pages = run.pages;
        pages.extend(summary);

        Ok(LabelDocument {
            bytes: render_document(&pages)?,
            normalization,
            unique_orders: aggregation.order_ids.len(),
            label_pages,
            summary_pages,
            distinct_skus: run.sku_totals.len(),
            total_units: aggregation.total_units(),
        })
    }

    async fn load(&self, document: LabelDocument) -> Result<GenerationReport> {
        self.storage.write_file(&self.output, &document.bytes).await?;
        tracing::info!("📁 Labels written to {}", self.output);

        Ok(GenerationReport {
            output_path: self.output.clone(),
            normalization: document.normalization,
            unique_orders: document.unique_orders,
            label_pages: document.label_pages,
            summary_pages: document.summary_pages,
            distinct_skus: document.distinct_skus,
            total_units: document.total_units,
            finished_at: chrono::Utc::now(),
        })
    }
}
