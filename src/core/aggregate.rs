use crate::domain::model::{AggregatedLine, OrderLine, OrderSource};
use indexmap::{IndexMap, IndexSet};

type LineKey = (String, String, String, String, OrderSource);

/// Result of grouping order lines.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Distinct order ids in the order they first appear in the input.
    pub order_ids: Vec<String>,
    /// One entry per (order, package, tracking, sku, source), in first-seen order.
    pub lines: Vec<AggregatedLine>,
}

impl Aggregation {
    /// Lines belonging to `order_id`, in aggregation order.
    pub fn lines_for<'a>(&'a self, order_id: &'a str) -> impl Iterator<Item = &'a AggregatedLine> + 'a {
        self.lines.iter().filter(move |l| l.order_id == order_id)
    }

    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

pub fn aggregate(lines: &[OrderLine]) -> Aggregation {
    let mut order_ids: IndexSet<&str> = IndexSet::new();
    let mut groups: IndexMap<LineKey, u64> = IndexMap::new();

    for line in lines {
        order_ids.insert(line.order_id.as_str());
        let key = (
            line.order_id.clone(),
            line.package_id.clone(),
            line.tracking_id.clone(),
            line.sku.clone(),
            line.source.clone(),
        );
        *groups.entry(key).or_insert(0) += u64::from(line.quantity);
    }

    tracing::debug!(
        "Aggregated {} lines into {} groups across {} orders",
        lines.len(),
        groups.len(),
        order_ids.len()
    );

    Aggregation {
        order_ids: order_ids.into_iter().map(str::to_string).collect(),
        lines: groups
            .into_iter()
            .map(
                |((order_id, package_id, tracking_id, sku, source), quantity)| AggregatedLine {
                    order_id,
                    package_id,
                    tracking_id,
                    sku,
                    source,
                    quantity,
                },
            )
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn line(order: &str, sku: &str, quantity: u32) -> OrderLine {
        OrderLine {
            order_id: order.to_string(),
            package_id: format!("PK-{}", order),
            tracking_id: format!("TRK-{}", order),
            sku: sku.to_string(),
            quantity,
            source: OrderSource::Primary,
        }
    }

    #[test]
    fn sums_quantities_per_key() {
        let input = vec![
            line("B", "X", 1),
            line("A", "X", 2),
            line("B", "X", 3),
            line("B", "Y", 1),
            line("A", "X", 1),
        ];

        let agg = aggregate(&input);

        assert_eq!(agg.order_ids, vec!["B", "A"]);
        assert_eq!(agg.lines.len(), 3);
        assert_eq!((agg.lines[0].sku.as_str(), agg.lines[0].quantity), ("X", 4));
        assert_eq!((agg.lines[1].order_id.as_str(), agg.lines[1].quantity), ("A", 3));
        assert_eq!(agg.lines_for("B").count(), 2);
        assert_eq!(agg.total_units(), 8);
    }

    #[test]
    fn per_order_totals_are_preserved() {
        let input: Vec<OrderLine> = (0..60)
            .map(|i| line(&format!("O{}", i % 7), &format!("S{}", i % 5), (i % 4) + 1))
            .collect();

        let agg = aggregate(&input);

        let mut before: HashMap<&str, u64> = HashMap::new();
        for l in &input {
            *before.entry(l.order_id.as_str()).or_default() += u64::from(l.quantity);
        }
        for order_id in &agg.order_ids {
            let after: u64 = agg.lines_for(order_id).map(|l| l.quantity).sum();
            assert_eq!(after, before[order_id.as_str()], "order {}", order_id);
        }
        assert_eq!(agg.order_ids.len(), before.len());
    }

    #[test]
    fn different_sources_stay_apart() {
        let mut other = line("A", "X", 1);
        other.source = OrderSource::Secondary;

        let agg = aggregate(&[line("A", "X", 1), other]);
        assert_eq!(agg.lines.len(), 2);
        assert_eq!(agg.order_ids.len(), 1);
    }

    #[test]
    fn large_quantities_are_not_capped() {
        let input = vec![line("A", "X", u32::MAX), line("A", "X", u32::MAX)];

        let agg = aggregate(&input);

        assert_eq!(agg.lines[0].quantity, 2 * u64::from(u32::MAX));
        assert_eq!(agg.total_units(), 2 * u64::from(u32::MAX));
    }
}
