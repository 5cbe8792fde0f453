//! Matching pages of an existing label document to tracking ids.
//!
//! Matching is plain substring containment on normalized text. Each page is
//! claimed by the first id, in target list order, that occurs in it. This is a
//! heuristic: a short id that is contained in a longer id, or in unrelated text on
//! another label, can claim the wrong page. Putting the list in the intended
//! priority order is the only tie-break.

use crate::domain::model::{normalize_identifier, PageRecord, RawSheet, SortStats};
use crate::utils::error::{LabelError, Result};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetId {
    pub raw: String,
    pub normalized: String,
}

/// Distinct tracking ids in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetIdList {
    ids: Vec<TargetId>,
}

impl TargetIdList {
    /// Build from raw ids. Ids that normalize to the same text, or to nothing,
    /// are kept only once / dropped.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: IndexMap<String, String> = IndexMap::new();
        for raw in ids {
            let raw = raw.into();
            let normalized = normalize_identifier(&raw);
            if normalized.is_empty() {
                continue;
            }
            seen.entry(normalized).or_insert(raw);
        }

        Self {
            ids: seen
                .into_iter()
                .map(|(normalized, raw)| TargetId { raw, normalized })
                .collect(),
        }
    }

    /// Read `column` from the sheet's first row header; empty cells are skipped.
    pub fn from_sheet(sheet: &RawSheet, column: &str) -> Result<Self> {
        let headers = sheet.headers(0);
        let index = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LabelError::MissingRequiredColumn {
                column: column.to_string(),
            })?;

        let ids = sheet
            .data_rows(0)
            .iter()
            .filter_map(|row| row.get(index).and_then(|c| c.as_text()));
        Ok(Self::from_ids(ids))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetId> {
        self.ids.iter()
    }
}

/// Outcome of matching: which pages go where, and the counts for the report.
#[derive(Debug, Clone, Default)]
pub struct MatchPlan {
    /// Page indices in output order.
    pub page_order: Vec<usize>,
    pub stats: SortStats,
}

pub fn match_pages(targets: &TargetIdList, pages: &[PageRecord]) -> MatchPlan {
    let mut assignments: IndexMap<String, Vec<usize>> = targets
        .iter()
        .map(|t| (t.normalized.clone(), Vec::new()))
        .collect();
    let mut unmatched_pages = 0;

    for page in pages {
        let owner = targets
            .iter()
            .find(|t| page.normalized_text.contains(t.normalized.as_str()));

        match owner {
            Some(target) => {
                if let Some(claimed) = assignments.get_mut(&target.normalized) {
                    claimed.push(page.index);
                }
            }
            None => {
                tracing::debug!("Page {} matched no tracking id", page.index + 1);
                unmatched_pages += 1;
            }
        }
    }

    let mut page_order = Vec::new();
    let mut missing_ids = Vec::new();
    for target in targets.iter() {
        match assignments.get(&target.normalized) {
            Some(claimed) if !claimed.is_empty() => page_order.extend(claimed),
            _ => missing_ids.push(target.raw.clone()),
        }
    }

    let stats = SortStats {
        total_ids: targets.len(),
        matched_ids: targets.len() - missing_ids.len(),
        missing_ids,
        unmatched_pages,
        emitted_pages: page_order.len(),
        source_pages: pages.len(),
    };

    MatchPlan {
        page_order,
        stats,
    }
}
