use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 3] = [Self::Active, Self::Inactive, Self::Discontinued];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Discontinued => "Discontinued",
        }
    }

    /// Case-insensitive parse; the error names the accepted values.
    ///
    /// # Errors
    ///
    /// Returns a message listing the valid statuses when `raw` matches none.
    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| "must be one of Active, Inactive, Discontinued".to_string())
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-supplied product fields, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub distributor_name: String,
    pub brand_name: String,
    pub product_code: String,
    pub product_secondary_code: Option<String>,
    pub product_name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub shipping_class: Option<String>,
    pub category_name: String,
    pub product_availability: String,
    pub status: ProductStatus,
    pub online: bool,
    pub superceded_by: Option<String>,
    pub ean: Option<String>,
    pub pack_size: i64,
    pub core_group: Option<String>,
    pub tax_exmt: bool,
    pub hyperlink: Option<String>,
    pub web_title: Option<String>,
    pub features_and_benefits_codes: Option<String>,
    pub badges_codes: Option<String>,
    pub stock_unmanaged: bool,
    pub trade: Decimal,
    pub rrp: Decimal,
    pub mwp: Option<Decimal>,
    pub go: Option<Decimal>,
}

/// A stored product with server-assigned identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewProduct,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Case-insensitive substring match on name, code, brand and category.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let d = &self.details;
        [
            &d.product_name,
            &d.product_code,
            &d.brand_name,
            &d.category_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Partial product update. Outer `None` keeps the stored value; for nullable
/// columns `Some(None)` clears it.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub distributor_name: Option<String>,
    pub brand_name: Option<String>,
    pub product_code: Option<String>,
    pub product_secondary_code: Option<Option<String>>,
    pub product_name: Option<String>,
    pub description: Option<Option<String>>,
    pub summary: Option<Option<String>>,
    pub shipping_class: Option<Option<String>>,
    pub category_name: Option<String>,
    pub product_availability: Option<String>,
    pub status: Option<ProductStatus>,
    pub online: Option<bool>,
    pub superceded_by: Option<Option<String>>,
    pub ean: Option<Option<String>>,
    pub pack_size: Option<i64>,
    pub core_group: Option<Option<String>>,
    pub tax_exmt: Option<bool>,
    pub hyperlink: Option<Option<String>>,
    pub web_title: Option<Option<String>>,
    pub features_and_benefits_codes: Option<Option<String>>,
    pub badges_codes: Option<Option<String>>,
    pub stock_unmanaged: Option<bool>,
    pub trade: Option<Decimal>,
    pub rrp: Option<Decimal>,
    pub mwp: Option<Option<Decimal>>,
    pub go: Option<Option<Decimal>>,
}

fn merge<T: Clone>(slot: &mut T, value: Option<&T>) {
    if let Some(v) = value {
        slot.clone_from(v);
    }
}

impl ProductPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, target: &mut NewProduct) {
        merge(&mut target.distributor_name, self.distributor_name.as_ref());
        merge(&mut target.brand_name, self.brand_name.as_ref());
        merge(&mut target.product_code, self.product_code.as_ref());
        merge(
            &mut target.product_secondary_code,
            self.product_secondary_code.as_ref(),
        );
        merge(&mut target.product_name, self.product_name.as_ref());
        merge(&mut target.description, self.description.as_ref());
        merge(&mut target.summary, self.summary.as_ref());
        merge(&mut target.shipping_class, self.shipping_class.as_ref());
        merge(&mut target.category_name, self.category_name.as_ref());
        merge(
            &mut target.product_availability,
            self.product_availability.as_ref(),
        );
        merge(&mut target.status, self.status.as_ref());
        merge(&mut target.online, self.online.as_ref());
        merge(&mut target.superceded_by, self.superceded_by.as_ref());
        merge(&mut target.ean, self.ean.as_ref());
        merge(&mut target.pack_size, self.pack_size.as_ref());
        merge(&mut target.core_group, self.core_group.as_ref());
        merge(&mut target.tax_exmt, self.tax_exmt.as_ref());
        merge(&mut target.hyperlink, self.hyperlink.as_ref());
        merge(&mut target.web_title, self.web_title.as_ref());
        merge(
            &mut target.features_and_benefits_codes,
            self.features_and_benefits_codes.as_ref(),
        );
        merge(&mut target.badges_codes, self.badges_codes.as_ref());
        merge(&mut target.stock_unmanaged, self.stock_unmanaged.as_ref());
        merge(&mut target.trade, self.trade.as_ref());
        merge(&mut target.rrp, self.rrp.as_ref());
        merge(&mut target.mwp, self.mwp.as_ref());
        merge(&mut target.go, self.go.as_ref());
    }
}
