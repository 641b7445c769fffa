use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    SellIn,
    SellThrough,
    PriceProtection,
    OffInvoiceDiscount,
}

impl DealType {
    pub const ALL: [DealType; 4] = [
        Self::SellIn,
        Self::SellThrough,
        Self::PriceProtection,
        Self::OffInvoiceDiscount,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SellIn => "sell_in",
            Self::SellThrough => "sell_through",
            Self::PriceProtection => "price_protection",
            Self::OffInvoiceDiscount => "off_invoice_discount",
        }
    }

    /// # Errors
    ///
    /// Returns a message listing the accepted values.
    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == raw)
            .ok_or_else(|| {
                "must be one of sell_in, sell_through, price_protection, off_invoice_discount"
                    .to_string()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    Quantity,
    Value,
}

impl AmountType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Value => "value",
        }
    }

    /// # Errors
    ///
    /// Returns a message listing the accepted values.
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "quantity" => Ok(Self::Quantity),
            "value" => Ok(Self::Value),
            _ => Err("must be one of quantity, value".to_string()),
        }
    }
}

/// Who funds the deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealProvider {
    #[serde(rename = "head office")]
    HeadOffice,
    #[serde(rename = "distributor")]
    Distributor,
    #[serde(rename = "narta")]
    Narta,
}

impl DealProvider {
    pub const ALL: [DealProvider; 3] = [Self::HeadOffice, Self::Distributor, Self::Narta];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeadOffice => "head office",
            Self::Distributor => "distributor",
            Self::Narta => "narta",
        }
    }

    /// Case-insensitive; `head_office` is accepted as an alias for query strings.
    ///
    /// # Errors
    ///
    /// Returns a message listing the accepted values.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim().to_lowercase().replace('_', " ");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| "must be one of head office, distributor, narta".to_string())
    }
}

/// Validated deal terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeal {
    pub product_id: i64,
    pub deal_type: DealType,
    pub amount_type: AmountType,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `YYYY-MM` of the month the deal is booked against.
    pub month_partition: String,
    pub provider: DealProvider,
    pub store_amount: Option<Decimal>,
    pub head_office_amount: Option<Decimal>,
    pub trade_price: Option<Decimal>,
}

impl NewDeal {
    /// Inclusive on both ends.
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    #[serde(flatten)]
    pub terms: NewDeal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealPatch {
    pub product_id: Option<i64>,
    pub deal_type: Option<DealType>,
    pub amount_type: Option<AmountType>,
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub month_partition: Option<String>,
    pub provider: Option<DealProvider>,
    pub store_amount: Option<Option<Decimal>>,
    pub head_office_amount: Option<Option<Decimal>>,
    pub trade_price: Option<Option<Decimal>>,
}

impl DealPatch {
    /// Merge into `target`, returning an error message when the merged date
    /// range ends before it starts.
    ///
    /// # Errors
    ///
    /// Returns the offending field path and message; `target` is untouched.
    pub fn apply(&self, target: &mut NewDeal) -> Result<(), (&'static str, String)> {
        let mut merged = target.clone();
        if let Some(v) = self.product_id {
            merged.product_id = v;
        }
        if let Some(v) = self.deal_type {
            merged.deal_type = v;
        }
        if let Some(v) = self.amount_type {
            merged.amount_type = v;
        }
        if let Some(v) = self.amount {
            merged.amount = v;
        }
        if let Some(v) = self.start_date {
            merged.start_date = v;
        }
        if let Some(v) = self.end_date {
            merged.end_date = v;
        }
        if let Some(v) = &self.month_partition {
            merged.month_partition.clone_from(v);
        }
        if let Some(v) = self.provider {
            merged.provider = v;
        }
        if let Some(v) = self.store_amount {
            merged.store_amount = v;
        }
        if let Some(v) = self.head_office_amount {
            merged.head_office_amount = v;
        }
        if let Some(v) = self.trade_price {
            merged.trade_price = v;
        }
        if merged.end_date < merged.start_date {
            return Err(("end_date", "must not be before start_date".to_string()));
        }
        *target = merged;
        Ok(())
    }
}
