//! Price level table operations.

use chrono::{DateTime, Utc};
use knaps_core::{NewPriceLevel, PriceLevel, PriceLevelPatch};

use crate::{DbError, Store, Tables};

impl Tables {
    pub(crate) fn insert_price_level(
        &mut self,
        details: NewPriceLevel,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<PriceLevel, DbError> {
        self.require_product(details.product_id)?;
        let level = PriceLevel {
            id: self.price_level_ids.next(),
            details,
            created_at,
            updated_at,
        };
        self.price_levels.insert(level.id, level.clone());
        Ok(level)
    }
}

impl Store {
    /// # Errors
    ///
    /// Returns [`DbError::ProductNotFound`] for an unknown `product_id`.
    pub async fn create_price_level(&self, details: NewPriceLevel) -> Result<PriceLevel, DbError> {
        let now = Utc::now();
        self.tables
            .write()
            .await
            .insert_price_level(details, Some(now), Some(now))
    }

    pub async fn get_price_level(&self, id: i64) -> Option<PriceLevel> {
        self.tables.read().await.price_levels.get(&id).cloned()
    }

    /// Every price level row for one product, oldest id first.
    pub async fn list_price_levels(&self, product_id: i64) -> Vec<PriceLevel> {
        self.tables
            .read()
            .await
            .price_levels
            .values()
            .filter(|l| l.details.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Returns `None` when the row does not exist.
    pub async fn update_price_level(
        &self,
        id: i64,
        patch: &PriceLevelPatch,
    ) -> Option<PriceLevel> {
        let mut tables = self.tables.write().await;
        let level = tables.price_levels.get_mut(&id)?;
        patch.apply(&mut level.details);
        let now = Utc::now();
        level.updated_at = Some(level.created_at.map_or(now, |created| now.max(created)));
        Some(level.clone())
    }

    pub async fn delete_price_level(&self, id: i64) -> bool {
        self.tables.write().await.price_levels.remove(&id).is_some()
    }
}
