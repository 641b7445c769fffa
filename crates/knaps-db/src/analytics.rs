//! Analytics aggregator.
//!
//! Rollups are recomputed from the ledgers on every call under one read
//! guard, so each result reflects a single consistent snapshot.

use std::collections::HashMap;

use knaps_core::{CatalogCounts, LedgerTotals, OverallAnalytics, ProductAnalytics};

use crate::{LedgerFilters, Store};

impl Store {
    /// Per-product rollups, highest revenue first.
    ///
    /// With `product_id` only that product is reported (empty if unknown).
    /// `month` restricts the ledger rows counted, not the products listed.
    /// Products with equal revenue keep id order.
    pub async fn product_analytics(
        &self,
        product_id: Option<i64>,
        month: Option<&str>,
    ) -> Vec<ProductAnalytics> {
        let tables = self.tables.read().await;
        let filters = LedgerFilters {
            product_id,
            month: month.map(ToOwned::to_owned),
        };

        let mut totals: HashMap<i64, LedgerTotals> = HashMap::new();
        for row in tables
            .sell_ins
            .values()
            .filter(|r| filters.matches(r.entry.product_id, &r.entry.month_partition))
        {
            totals.entry(row.entry.product_id).or_default().add_sell_in(row);
        }
        for row in tables
            .sell_throughs
            .values()
            .filter(|r| filters.matches(r.entry.product_id, &r.entry.month_partition))
        {
            totals
                .entry(row.entry.product_id)
                .or_default()
                .add_sell_through(row);
        }

        let empty = LedgerTotals::default();
        let mut rows: Vec<ProductAnalytics> = tables
            .products
            .values()
            .filter(|p| product_id.is_none_or(|id| id == p.id))
            .map(|p| ProductAnalytics::new(p, totals.get(&p.id).unwrap_or(&empty)))
            .collect();
        rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
        rows
    }

    /// Fleet-wide rollup over every ledger row in `month` (or all months).
    ///
    /// Turnover is recomputed from the summed quantities rather than
    /// averaged across products. Catalog counts ignore `month`.
    pub async fn overall_analytics(&self, month: Option<&str>) -> OverallAnalytics {
        let tables = self.tables.read().await;
        let filters = LedgerFilters::month(month);

        let mut totals = LedgerTotals::default();
        for row in tables
            .sell_ins
            .values()
            .filter(|r| filters.matches(r.entry.product_id, &r.entry.month_partition))
        {
            totals.add_sell_in(row);
        }
        for row in tables
            .sell_throughs
            .values()
            .filter(|r| filters.matches(r.entry.product_id, &r.entry.month_partition))
        {
            totals.add_sell_through(row);
        }

        OverallAnalytics::new(&totals, CatalogCounts::from_products(tables.products.values()))
    }
}
