//! Deal table operations.

use chrono::{DateTime, NaiveDate, Utc};
use knaps_core::{Deal, DealPatch, DealProvider, DealType, NewDeal};

use crate::{DbError, Store, Tables};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilters {
    pub product_id: Option<i64>,
    pub provider: Option<DealProvider>,
    pub deal_type: Option<DealType>,
    /// Only deals whose date range covers this day.
    pub active_on: Option<NaiveDate>,
}

impl DealFilters {
    fn matches(&self, deal: &Deal) -> bool {
        let terms = &deal.terms;
        self.product_id.is_none_or(|id| id == terms.product_id)
            && self.provider.is_none_or(|p| p == terms.provider)
            && self.deal_type.is_none_or(|t| t == terms.deal_type)
            && self.active_on.is_none_or(|day| terms.is_active_on(day))
    }
}

impl Tables {
    pub(crate) fn insert_deal(
        &mut self,
        terms: NewDeal,
        now: DateTime<Utc>,
    ) -> Result<Deal, DbError> {
        self.require_product(terms.product_id)?;
        let deal = Deal {
            id: self.deal_ids.next(),
            terms,
            created_at: now,
            updated_at: now,
        };
        self.deals.insert(deal.id, deal.clone());
        Ok(deal)
    }
}

impl Store {
    /// # Errors
    ///
    /// Returns [`DbError::ProductNotFound`] for an unknown `product_id`.
    pub async fn create_deal(&self, terms: NewDeal) -> Result<Deal, DbError> {
        self.tables.write().await.insert_deal(terms, Utc::now())
    }

    pub async fn get_deal(&self, id: i64) -> Option<Deal> {
        self.tables.read().await.deals.get(&id).cloned()
    }

    pub async fn list_deals(&self, filters: &DealFilters) -> Vec<Deal> {
        self.tables
            .read()
            .await
            .deals
            .values()
            .filter(|d| filters.matches(d))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over the linked product's code, name
    /// and brand, and the deal's provider and type labels.
    pub async fn search_deals(&self, query: &str) -> Vec<Deal> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        tables
            .deals
            .values()
            .filter(|deal| {
                let labels = [deal.terms.provider.as_str(), deal.terms.deal_type.as_str()];
                labels.iter().any(|l| l.contains(&needle))
                    || tables
                        .products
                        .get(&deal.terms.product_id)
                        .is_some_and(|p| {
                            [
                                &p.details.product_code,
                                &p.details.product_name,
                                &p.details.brand_name,
                            ]
                            .iter()
                            .any(|field| field.to_lowercase().contains(&needle))
                        })
            })
            .cloned()
            .collect()
    }

    /// Returns `Ok(None)` when the deal does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ProductNotFound`] if the patch points the deal at an
    /// unknown product, or [`DbError::Invalid`] if the merged date range is
    /// inverted.
    pub async fn update_deal(&self, id: i64, patch: &DealPatch) -> Result<Option<Deal>, DbError> {
        let mut tables = self.tables.write().await;
        if !tables.deals.contains_key(&id) {
            return Ok(None);
        }
        if let Some(product_id) = patch.product_id {
            tables.require_product(product_id)?;
        }
        let Some(deal) = tables.deals.get_mut(&id) else {
            return Ok(None);
        };
        patch
            .apply(&mut deal.terms)
            .map_err(|(field, message)| DbError::Invalid { field, message })?;
        deal.updated_at = Utc::now().max(deal.created_at);
        Ok(Some(deal.clone()))
    }

    pub async fn delete_deal(&self, id: i64) -> bool {
        self.tables.write().await.deals.remove(&id).is_some()
    }
}
