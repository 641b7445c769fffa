//! In-memory record store for products, ledgers, deals and price levels.
//!
//! [`Store`] is an explicitly owned handle: clone it to share one set of
//! tables, or construct a new one for an isolated instance. All tables sit
//! behind a single async `RwLock`, so id assignment and map mutation happen
//! under the same write guard.

use std::collections::BTreeMap;
use std::sync::Arc;

use knaps_core::{Deal, PriceLevel, Product, SellIn, SellThrough};
use thiserror::Error;
use tokio::sync::RwLock;

pub mod analytics;
pub mod catalog;
pub mod deals;
pub mod ledger;
pub mod price_levels;
pub mod products;
pub mod seed;

pub use catalog::{BrandSummary, DistributorSummary};
pub use deals::DealFilters;
pub use ledger::LedgerFilters;
pub use products::ProductFilters;
pub use seed::SeedSummary;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    #[error("product code already exists: {0}")]
    DuplicateProductCode(String),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("product {product_id} has {entries} ledger entries and cannot be deleted")]
    ProductHasLedgerEntries { product_id: i64, entries: usize },

    #[error("{field} {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Monotonic id counter; the first id handed out is 1.
#[derive(Debug, Default)]
struct IdSequence(i64);

impl IdSequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    sell_ins: BTreeMap<i64, SellIn>,
    sell_throughs: BTreeMap<i64, SellThrough>,
    deals: BTreeMap<i64, Deal>,
    price_levels: BTreeMap<i64, PriceLevel>,
    product_ids: IdSequence,
    sell_in_ids: IdSequence,
    sell_through_ids: IdSequence,
    deal_ids: IdSequence,
    price_level_ids: IdSequence,
}

impl Tables {
    fn require_product(&self, product_id: i64) -> Result<&Product, DbError> {
        self.products
            .get(&product_id)
            .ok_or(DbError::ProductNotFound(product_id))
    }

    fn code_taken(&self, code: &str, except: Option<i64>) -> bool {
        self.products
            .values()
            .any(|p| p.details.product_code == code && Some(p.id) != except)
    }
}
