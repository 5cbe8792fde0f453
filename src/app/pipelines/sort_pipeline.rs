use crate::adapters::pdf::{extract_pages, load_document, reorder_pages};
use crate::adapters::spreadsheet::load_sheet;
use crate::config::toml_config::DEFAULT_TRACKING_COLUMN;
use crate::core::matcher::{match_pages, TargetIdList};
use crate::domain::model::{SortReport, SortStats};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{LabelError, Result};
use async_trait::async_trait;
use lopdf::Document;

/// Tracking ids from the spreadsheet plus the parsed label document.
pub struct SortInput {
    pub targets: TargetIdList,
    pub document: Document,
}

#[derive(Debug)]
pub struct SortedDocument {
    pub bytes: Vec<u8>,
    pub stats: SortStats,
}

/// Existing label PDF → the same pages in spreadsheet tracking id order.
pub struct SortPipeline<S: Storage> {
    storage: S,
    spreadsheet: String,
    document: String,
    output: String,
    tracking_column: String,
}

impl<S: Storage> SortPipeline<S> {
    pub fn new(
        storage: S,
        spreadsheet: impl Into<String>,
        document: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            spreadsheet: spreadsheet.into(),
            document: document.into(),
            output: output.into(),
            tracking_column: DEFAULT_TRACKING_COLUMN.to_string(),
        }
    }

    pub fn with_tracking_column(mut self, column: impl Into<String>) -> Self {
        self.tracking_column = column.into();
        self
    }
}

#[async_trait]
impl<S: Storage> Pipeline for SortPipeline<S> {
    type Extracted = SortInput;
    type Transformed = SortedDocument;
    type Report = SortReport;

    fn name(&self) -> &'static str {
        "sort-labels"
    }

    async fn extract(&self) -> Result<SortInput> {
        let sheet_bytes = self.storage.read_file(&self.spreadsheet).await.map_err(|e| {
            LabelError::SpreadsheetReadFailure {
                path: self.spreadsheet.clone(),
                message: e.to_string(),
            }
        })?;
        let sheet = load_sheet(&self.spreadsheet, sheet_bytes)?;

        // 欄位不存在時不必讀取 PDF
        let targets = TargetIdList::from_sheet(&sheet, &self.tracking_column)?;
        tracing::info!("🎯 {} distinct tracking ids", targets.len());

        let doc_bytes = self.storage.read_file(&self.document).await.map_err(|e| {
            LabelError::DocumentReadFailure {
                path: self.document.clone(),
                message: e.to_string(),
            }
        })?;
        let document = load_document(&self.document, &doc_bytes)?;

        Ok(SortInput { targets, document })
    }

    async fn transform(&self, input: SortInput) -> Result<SortedDocument> {
        let pages = extract_pages(&input.document);
        tracing::debug!("Scanning {} pages", pages.len());

        let plan = match_pages(&input.targets, &pages);
        let stats = plan.stats;

        if !stats.missing_ids.is_empty() {
            tracing::warn!(
                "⚠️ {} tracking ids have no page: {}",
                stats.missing_ids.len(),
                stats.missing_ids.join(", ")
            );
        }
        if stats.unmatched_pages > 0 {
            tracing::warn!(
                "⚠️ {} pages matched no tracking id and were left out",
                stats.unmatched_pages
            );
        }
        if plan.page_order.is_empty() {
            tracing::warn!(
                "⚠️ None of the {} pages matched, writing an empty document",
                pages.len()
            );
        }

        tracing::info!(
            "🔀 {} of {} ids matched, {} pages emitted",
            stats.matched_ids,
            stats.total_ids,
            stats.emitted_pages
        );

        Ok(SortedDocument {
            bytes: reorder_pages(input.document, &plan.page_order)?,
            stats,
        })
    }

    async fn load(&self, sorted: SortedDocument) -> Result<SortReport> {
        self.storage.write_file(&self.output, &sorted.bytes).await?;
        tracing::info!("📁 Sorted labels written to {}", self.output);

        Ok(SortReport {
            output_path: self.output.clone(),
            stats: sorted.stats,
            finished_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pdf::render_document;
    use crate::app::pipelines::test_support::MockStorage;
    use crate::core::etl::EtlEngine;
    use crate::render::{DrawOp, Font, Page};

    fn label_pdf(texts: &[&str]) -> Vec<u8> {
        let pages: Vec<Page> = texts
            .iter()
            .map(|t| {
                let mut page = Page::new(180.0, 108.0);
                page.ops.push(DrawOp::text(Font::HelveticaBold, 12.0, 6.0, 80.0, *t));
                page
            })
            .collect();
        render_document(&pages).unwrap()
    }

    async fn storage_with(sheet: &str, pdf: Vec<u8>) -> MockStorage {
        let storage = MockStorage::new();
        storage.put_file("ship.csv", sheet.as_bytes().to_vec()).await;
        storage.put_file("labels.pdf", pdf).await;
        storage
    }

    #[tokio::test]
    async fn pages_follow_spreadsheet_order() {
        let storage = storage_with(
            "Tracking ID\nC3\nA1\nB2\n",
            label_pdf(&["Guía: A-1", "Guía: B 2", "Guía: C-3"]),
        )
        .await;

        let pipeline = SortPipeline::new(storage.clone(), "ship.csv", "labels.pdf", "sorted.pdf");
        let report = EtlEngine::new(pipeline).run().await.unwrap();

        assert_eq!(report.stats.emitted_pages, 3);
        assert!(report.stats.missing_ids.is_empty());

        let bytes = storage.get_file("sorted.pdf").await.unwrap();
        let pages = extract_pages(&load_document("sorted.pdf", &bytes).unwrap());
        let order: Vec<bool> = ["C3", "A1", "B2"]
            .iter()
            .zip(&pages)
            .map(|(id, page)| page.normalized_text.contains(id))
            .collect();
        assert_eq!(order, vec![true, true, true]);
    }

    #[tokio::test]
    async fn missing_column_fails_before_document_is_read() {
        // No document in storage: reaching it would be a DocumentReadFailure
        let storage = MockStorage::new();
        storage.put_file("ship.csv", b"Order ID\nO1\n".to_vec()).await;

        let pipeline = SortPipeline::new(storage, "ship.csv", "labels.pdf", "sorted.pdf");
        let err = pipeline.extract().await.err().unwrap();

        assert!(matches!(err, LabelError::MissingRequiredColumn { column } if column == "Tracking ID"));
    }

    #[tokio::test]
    async fn nothing_matched_still_writes_report_and_document() {
        let storage = storage_with("Tracking ID\nZZ9\n", label_pdf(&["Guía: A1"])).await;

        let pipeline = SortPipeline::new(storage.clone(), "ship.csv", "labels.pdf", "sorted.pdf");
        let report = EtlEngine::new(pipeline).run().await.unwrap();

        assert_eq!(report.stats.missing_ids, vec!["ZZ9".to_string()]);
        assert_eq!(report.stats.unmatched_pages, 1);
        assert_eq!(report.stats.emitted_pages, 0);

        let bytes = storage.get_file("sorted.pdf").await.unwrap();
        assert!(extract_pages(&load_document("sorted.pdf", &bytes).unwrap()).is_empty());
    }

    #[tokio::test]
    async fn blank_tracking_column_yields_empty_document() {
        let storage = storage_with("Tracking ID\n\n  \n", label_pdf(&["Guía: A1"])).await;

        let pipeline = SortPipeline::new(storage.clone(), "ship.csv", "labels.pdf", "sorted.pdf");
        let report = EtlEngine::new(pipeline).run().await.unwrap();

        assert_eq!(report.stats.total_ids, 0);
        assert_eq!(report.stats.unmatched_pages, 1);
        assert!(storage.get_file("sorted.pdf").await.is_some());
    }

    #[tokio::test]
    async fn configured_column_name() {
        let storage = storage_with("Guide\nA1\n", label_pdf(&["A1"])).await;

        let pipeline = SortPipeline::new(storage, "ship.csv", "labels.pdf", "sorted.pdf")
            .with_tracking_column("Guide");
        let report = EtlEngine::new(pipeline).run().await.unwrap();

        assert_eq!(report.stats.matched_ids, 1);
    }
}
