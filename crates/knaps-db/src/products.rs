//! Product table operations.

use chrono::{DateTime, Utc};
use knaps_core::{NewProduct, Product, ProductPatch};

use crate::{DbError, Store, Tables};

/// Core-range listing filters. Names match exactly, ignoring case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub distributor: Option<String>,
    pub brand: Option<String>,
    /// Any of these groups; empty means every product, grouped or not.
    pub core_groups: Vec<String>,
}

impl ProductFilters {
    fn matches(&self, product: &Product) -> bool {
        let details = &product.details;
        self.distributor
            .as_deref()
            .is_none_or(|d| d.eq_ignore_ascii_case(&details.distributor_name))
            && self
                .brand
                .as_deref()
                .is_none_or(|b| b.eq_ignore_ascii_case(&details.brand_name))
            && (self.core_groups.is_empty()
                || details.core_group.as_deref().is_some_and(|group| {
                    self.core_groups
                        .iter()
                        .any(|g| g.eq_ignore_ascii_case(group))
                }))
    }
}

impl Tables {
    pub(crate) fn insert_product(
        &mut self,
        details: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Product, DbError> {
        if self.code_taken(&details.product_code, None) {
            return Err(DbError::DuplicateProductCode(details.product_code));
        }
        let product = Product {
            id: self.product_ids.next(),
            details,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(product.id, product.clone());
        Ok(product)
    }
}

impl Store {
    /// All products in id order.
    pub async fn list_products(&self) -> Vec<Product> {
        self.tables.read().await.products.values().cloned().collect()
    }

    pub async fn product_count(&self) -> usize {
        self.tables.read().await.products.len()
    }

    pub async fn get_product(&self, id: i64) -> Option<Product> {
        self.tables.read().await.products.get(&id).cloned()
    }

    /// Exact, case-sensitive match on `product_code`.
    pub async fn get_product_by_code(&self, code: &str) -> Option<Product> {
        self.tables
            .read()
            .await
            .products
            .values()
            .find(|p| p.details.product_code == code)
            .cloned()
    }

    /// Products passing `filters`, in id order.
    pub async fn filter_products(&self, filters: &ProductFilters) -> Vec<Product> {
        self.tables
            .read()
            .await
            .products
            .values()
            .filter(|p| filters.matches(p))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over name, code, brand and category.
    ///
    /// No minimum query length is enforced here.
    pub async fn search_products(&self, query: &str) -> Vec<Product> {
        let needle = query.to_lowercase();
        self.tables
            .read()
            .await
            .products
            .values()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`DbError::DuplicateProductCode`] if the code is already stored.
    pub async fn create_product(&self, details: NewProduct) -> Result<Product, DbError> {
        self.tables.write().await.insert_product(details, Utc::now())
    }

    /// Merge `patch` into product `id` and refresh `updated_at`.
    ///
    /// Returns `Ok(None)` when the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::DuplicateProductCode`] if the patch moves the product
    /// onto a code held by another product.
    pub async fn update_product(
        &self,
        id: i64,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, DbError> {
        let mut tables = self.tables.write().await;
        if let Some(code) = &patch.product_code {
            if tables.products.contains_key(&id) && tables.code_taken(code, Some(id)) {
                return Err(DbError::DuplicateProductCode(code.clone()));
            }
        }
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(&mut product.details);
        product.updated_at = Utc::now().max(product.created_at);
        Ok(Some(product.clone()))
    }

    /// Hard-delete product `id` together with its deals and price levels.
    ///
    /// Returns `Ok(false)` when nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ProductHasLedgerEntries`] while sell-in or
    /// sell-through rows still reference the product.
    pub async fn delete_product(&self, id: i64) -> Result<bool, DbError> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Ok(false);
        }
        let entries = tables
            .sell_ins
            .values()
            .filter(|r| r.entry.product_id == id)
            .count()
            + tables
                .sell_throughs
                .values()
                .filter(|r| r.entry.product_id == id)
                .count();
        if entries > 0 {
            return Err(DbError::ProductHasLedgerEntries {
                product_id: id,
                entries,
            });
        }
        tables.deals.retain(|_, d| d.terms.product_id != id);
        tables.price_levels.retain(|_, l| l.details.product_id != id);
        Ok(tables.products.remove(&id).is_some())
    }
}
