//! Sell-in and sell-through ledger rows.
//!
//! Both ledgers are append-only: rows are created and listed, never updated.
//! Each row carries a denormalized `month_partition` (`YYYY-MM`) derived from
//! its transaction date so analytics can filter by month without date math.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock received into the store from a distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSellIn {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub transaction_date: NaiveDate,
    pub month_partition: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellIn {
    pub id: i64,
    #[serde(flatten)]
    pub entry: NewSellIn,
    pub created_at: DateTime<Utc>,
}

/// Stock sold out to an end customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSellThrough {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_revenue: Decimal,
    pub transaction_date: NaiveDate,
    pub month_partition: String,
    pub customer_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellThrough {
    pub id: i64,
    #[serde(flatten)]
    pub entry: NewSellThrough,
    pub created_at: DateTime<Utc>,
}

/// The `YYYY-MM` partition key for a transaction date.
#[must_use]
pub fn month_partition_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// `true` for exactly seven characters shaped `YYYY-MM` with a month of 01-12.
#[must_use]
pub fn is_valid_month_partition(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !digits(0..4) || !digits(5..7) {
        return false;
    }
    matches!(raw[5..7].parse::<u8>(), Ok(1..=12))
}
