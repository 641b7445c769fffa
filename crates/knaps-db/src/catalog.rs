//! Distributor and brand rollups derived from the product table.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributorSummary {
    pub name: String,
    pub brand_count: usize,
    pub product_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandSummary {
    pub name: String,
    pub distributor_name: String,
    pub product_count: usize,
}

impl Store {
    /// Distinct distributors ordered by name.
    pub async fn list_distributors(&self) -> Vec<DistributorSummary> {
        let tables = self.tables.read().await;
        let mut by_name: BTreeMap<&str, (BTreeSet<&str>, usize)> = BTreeMap::new();
        for product in tables.products.values() {
            let d = &product.details;
            if d.distributor_name.is_empty() {
                continue;
            }
            let (brands, count) = by_name.entry(d.distributor_name.as_str()).or_default();
            if !d.brand_name.is_empty() {
                brands.insert(d.brand_name.as_str());
            }
            *count += 1;
        }
        by_name
            .into_iter()
            .map(|(name, (brands, product_count))| DistributorSummary {
                name: name.to_string(),
                brand_count: brands.len(),
                product_count,
            })
            .collect()
    }

    /// Distinct (brand, distributor) pairs ordered by brand then distributor,
    /// optionally limited to one distributor (case-insensitive).
    pub async fn list_brands(&self, distributor: Option<&str>) -> Vec<BrandSummary> {
        let tables = self.tables.read().await;
        let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for product in tables.products.values() {
            let d = &product.details;
            if d.brand_name.is_empty() {
                continue;
            }
            if distributor.is_some_and(|want| !d.distributor_name.eq_ignore_ascii_case(want)) {
                continue;
            }
            *counts
                .entry((d.brand_name.as_str(), d.distributor_name.as_str()))
                .or_default() += 1;
        }
        counts
            .into_iter()
            .map(|((name, distributor_name), product_count)| BrandSummary {
                name: name.to_string(),
                distributor_name: distributor_name.to_string(),
                product_count,
            })
            .collect()
    }
}
