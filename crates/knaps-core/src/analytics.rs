//! Sell-in / sell-through rollups.
//!
//! Quantities and revenue are summed exactly; turnover is the only derived
//! ratio and is rounded once, after summing.

use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ledger::{SellIn, SellThrough};
use crate::products::{Product, ProductStatus};

/// Percentage of received stock that has sold through, to one decimal place.
///
/// Zero when nothing was received.
#[must_use]
pub fn turnover_rate(sell_in_quantity: i64, sell_through_quantity: i64) -> Decimal {
    if sell_in_quantity == 0 {
        return Decimal::ZERO;
    }
    let ratio = Decimal::from(sell_through_quantity) * Decimal::ONE_HUNDRED
        / Decimal::from(sell_in_quantity);
    ratio.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Running sums over a set of ledger rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub sell_in_quantity: i64,
    pub sell_through_quantity: i64,
    pub total_revenue: Decimal,
}

impl LedgerTotals {
    pub fn add_sell_in(&mut self, row: &SellIn) {
        self.sell_in_quantity = self.sell_in_quantity.saturating_add(row.entry.quantity);
    }

    pub fn add_sell_through(&mut self, row: &SellThrough) {
        self.sell_through_quantity = self
            .sell_through_quantity
            .saturating_add(row.entry.quantity);
        self.total_revenue = self.total_revenue.saturating_add(row.entry.total_revenue);
    }

    /// Received minus sold; negative when more was sold than received.
    #[must_use]
    pub fn current_stock(&self) -> i64 {
        self.sell_in_quantity
            .saturating_sub(self.sell_through_quantity)
    }

    #[must_use]
    pub fn turnover_rate(&self) -> Decimal {
        turnover_rate(self.sell_in_quantity, self.sell_through_quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAnalytics {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub brand_name: String,
    pub sell_in_quantity: i64,
    pub sell_through_quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub turnover_rate: Decimal,
    pub total_revenue: Decimal,
    pub current_stock: i64,
}

impl ProductAnalytics {
    #[must_use]
    pub fn new(product: &Product, totals: &LedgerTotals) -> Self {
        Self {
            product_id: product.id,
            product_name: product.details.product_name.clone(),
            product_code: product.details.product_code.clone(),
            brand_name: product.details.brand_name.clone(),
            sell_in_quantity: totals.sell_in_quantity,
            sell_through_quantity: totals.sell_through_quantity,
            turnover_rate: totals.turnover_rate(),
            total_revenue: totals.total_revenue,
            current_stock: totals.current_stock(),
        }
    }
}

/// Catalog-wide counts; never filtered by month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub total_products: usize,
    pub active_products: usize,
    pub total_brands: usize,
    pub total_categories: usize,
    pub total_distributors: usize,
}

impl CatalogCounts {
    /// Distinct non-empty brand, category and distributor names.
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut counts = Self::default();
        let mut brands = HashSet::new();
        let mut categories = HashSet::new();
        let mut distributors = HashSet::new();
        for product in products {
            let d = &product.details;
            counts.total_products += 1;
            if d.status == ProductStatus::Active {
                counts.active_products += 1;
            }
            if !d.brand_name.is_empty() {
                brands.insert(d.brand_name.as_str());
            }
            if !d.category_name.is_empty() {
                categories.insert(d.category_name.as_str());
            }
            if !d.distributor_name.is_empty() {
                distributors.insert(d.distributor_name.as_str());
            }
        }
        counts.total_brands = brands.len();
        counts.total_categories = categories.len();
        counts.total_distributors = distributors.len();
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallAnalytics {
    pub total_sell_in: i64,
    pub total_sell_through: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_turnover_rate: Decimal,
    pub total_revenue: Decimal,
    #[serde(flatten)]
    pub catalog: CatalogCounts,
}

impl OverallAnalytics {
    #[must_use]
    pub fn new(totals: &LedgerTotals, catalog: CatalogCounts) -> Self {
        Self {
            total_sell_in: totals.sell_in_quantity,
            total_sell_through: totals.sell_through_quantity,
            average_turnover_rate: totals.turnover_rate(),
            total_revenue: totals.total_revenue,
            catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn turnover_is_zero_without_sell_in() {
        assert_eq!(turnover_rate(0, 0), Decimal::ZERO);
        assert_eq!(turnover_rate(0, 25), Decimal::ZERO);
    }

    #[test]
    fn turnover_rounds_to_one_decimal() {
        assert_eq!(turnover_rate(50, 30), Decimal::from_str("60.0").unwrap());
        assert_eq!(turnover_rate(3, 1), Decimal::from_str("33.3").unwrap());
        assert_eq!(turnover_rate(3, 2), Decimal::from_str("66.7").unwrap());
        assert_eq!(turnover_rate(40, 25), Decimal::from_str("62.5").unwrap());
    }

    #[test]
    fn turnover_rounds_midpoint_away_from_zero() {
        // 1/16 * 100 = 6.25
        assert_eq!(turnover_rate(16, 1), Decimal::from_str("6.3").unwrap());
        // 3/16 * 100 = 18.75
        assert_eq!(turnover_rate(16, 3), Decimal::from_str("18.8").unwrap());
    }

    #[test]
    fn turnover_can_exceed_one_hundred() {
        assert_eq!(turnover_rate(10, 15), Decimal::from_str("150.0").unwrap());
    }

    #[test]
    fn current_stock_may_go_negative() {
        let totals = LedgerTotals {
            sell_in_quantity: 5,
            sell_through_quantity: 8,
            total_revenue: Decimal::ZERO,
        };
        assert_eq!(totals.current_stock(), -3);
    }

    #[test]
    fn overall_serializes_turnover_as_number() {
        let totals = LedgerTotals {
            sell_in_quantity: 50,
            sell_through_quantity: 30,
            total_revenue: Decimal::from_str("9000.00").unwrap(),
        };
        let overall = OverallAnalytics::new(&totals, CatalogCounts::default());
        let json = serde_json::to_value(&overall).unwrap();
        assert_eq!(json["average_turnover_rate"], 60.0);
        assert_eq!(json["total_revenue"], "9000.00");
        assert_eq!(json["total_products"], 0);
    }
}
