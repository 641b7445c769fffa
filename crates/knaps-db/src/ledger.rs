//! Append-only sell-in and sell-through ledgers.

use chrono::{DateTime, Utc};
use knaps_core::{NewSellIn, NewSellThrough, SellIn, SellThrough};

use crate::{DbError, Store, Tables};

/// AND-combined exact-match filters; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilters {
    pub product_id: Option<i64>,
    pub month: Option<String>,
}

impl LedgerFilters {
    #[must_use]
    pub fn month(month: Option<&str>) -> Self {
        Self {
            product_id: None,
            month: month.map(ToOwned::to_owned),
        }
    }

    pub(crate) fn matches(&self, product_id: i64, month_partition: &str) -> bool {
        self.product_id.is_none_or(|id| id == product_id)
            && self
                .month
                .as_deref()
                .is_none_or(|month| month == month_partition)
    }
}

impl Tables {
    pub(crate) fn insert_sell_in(
        &mut self,
        entry: NewSellIn,
        now: DateTime<Utc>,
    ) -> Result<SellIn, DbError> {
        self.require_product(entry.product_id)?;
        let row = SellIn {
            id: self.sell_in_ids.next(),
            entry,
            created_at: now,
        };
        self.sell_ins.insert(row.id, row.clone());
        Ok(row)
    }

    pub(crate) fn insert_sell_through(
        &mut self,
        entry: NewSellThrough,
        now: DateTime<Utc>,
    ) -> Result<SellThrough, DbError> {
        self.require_product(entry.product_id)?;
        let row = SellThrough {
            id: self.sell_through_ids.next(),
            entry,
            created_at: now,
        };
        self.sell_throughs.insert(row.id, row.clone());
        Ok(row)
    }
}

impl Store {
    /// # Errors
    ///
    /// Returns [`DbError::ProductNotFound`] for an unknown `product_id`.
    pub async fn create_sell_in(&self, entry: NewSellIn) -> Result<SellIn, DbError> {
        self.tables.write().await.insert_sell_in(entry, Utc::now())
    }

    /// # Errors
    ///
    /// Returns [`DbError::ProductNotFound`] for an unknown `product_id`.
    pub async fn create_sell_through(
        &self,
        entry: NewSellThrough,
    ) -> Result<SellThrough, DbError> {
        self.tables
            .write()
            .await
            .insert_sell_through(entry, Utc::now())
    }

    pub async fn list_sell_ins(&self, filters: &LedgerFilters) -> Vec<SellIn> {
        self.tables
            .read()
            .await
            .sell_ins
            .values()
            .filter(|r| filters.matches(r.entry.product_id, &r.entry.month_partition))
            .cloned()
            .collect()
    }

    pub async fn list_sell_throughs(&self, filters: &LedgerFilters) -> Vec<SellThrough> {
        self.tables
            .read()
            .await
            .sell_throughs
            .values()
            .filter(|r| filters.matches(r.entry.product_id, &r.entry.month_partition))
            .cloned()
            .collect()
    }
}
