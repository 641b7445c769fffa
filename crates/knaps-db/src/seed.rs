//! Bulk load of a validated seed file.

use std::collections::HashSet;

use chrono::Utc;
use knaps_core::SeedFile;
use serde::Serialize;
use tracing::info;

use crate::{DbError, Store};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub products: usize,
    pub price_levels: usize,
    pub deals: usize,
    pub sell_ins: usize,
    pub sell_throughs: usize,
}

impl Store {
    /// Insert every product in `seed` with its nested rows.
    ///
    /// Nested rows are re-pointed at the id assigned to their product.
    /// Nothing is inserted if any product code is already stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::DuplicateProductCode`] for the first clashing code.
    pub async fn load_seed(&self, seed: SeedFile) -> Result<SeedSummary, DbError> {
        let mut tables = self.tables.write().await;

        let mut incoming = HashSet::new();
        for item in &seed.products {
            let code = item.product.product_code.as_str();
            if !incoming.insert(code) || tables.code_taken(code, None) {
                return Err(DbError::DuplicateProductCode(code.to_string()));
            }
        }

        let now = Utc::now();
        let mut summary = SeedSummary::default();
        for item in seed.products {
            let product = tables.insert_product(item.product, now)?;
            summary.products += 1;

            for mut level in item.price_levels {
                level.level.product_id = product.id;
                tables.insert_price_level(level.level, level.created_at, level.updated_at)?;
                summary.price_levels += 1;
            }
            for mut deal in item.deals {
                deal.product_id = product.id;
                tables.insert_deal(deal, now)?;
                summary.deals += 1;
            }
            for mut entry in item.sell_ins {
                entry.product_id = product.id;
                tables.insert_sell_in(entry, now)?;
                summary.sell_ins += 1;
            }
            for mut entry in item.sell_throughs {
                entry.product_id = product.id;
                tables.insert_sell_through(entry, now)?;
                summary.sell_throughs += 1;
            }
        }

        info!(
            products = summary.products,
            price_levels = summary.price_levels,
            deals = summary.deals,
            sell_ins = summary.sell_ins,
            sell_throughs = summary.sell_throughs,
            "seed loaded"
        );
        Ok(summary)
    }
}
