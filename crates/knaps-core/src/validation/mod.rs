//! Schema validation for loosely-typed request bodies.
//!
//! Every validator walks a `serde_json::Value`, records one [`FieldError`] per
//! offending field, and only yields a typed value when no field failed. All
//! errors are collected; validation never stops at the first failure.

mod deals;
mod ledger;
mod price_levels;
mod pricing;
mod products;

pub use deals::{validate_deal_patch, validate_new_deal};
pub use ledger::{validate_new_sell_in, validate_new_sell_through};
pub use price_levels::{validate_new_price_level, validate_price_level_patch};
pub use pricing::validate_margin_request;
pub use products::{validate_new_product, validate_product_patch};

pub(crate) use deals::deal_fields;
pub(crate) use ledger::{sell_in_fields, sell_through_fields};
pub(crate) use price_levels::price_level_fields;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single field-level validation failure with a machine-readable path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Nest this error under `prefix`, e.g. `trade` under `products.2`.
    #[must_use]
    pub fn prefixed(self, prefix: &str) -> Self {
        let path = if self.path.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}.{}", self.path)
        };
        Self { path, ..self }
    }
}

/// Render errors as `path: message; path: message` for logs and error text.
#[must_use]
pub fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| {
            if e.path.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.path, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Field reader over a JSON object that accumulates errors.
///
/// Required accessors return a placeholder when the field is invalid; callers
/// must go through [`Fields::finish`] before trusting the assembled value.
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(value: &'a Value) -> Result<Self, Vec<FieldError>> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                errors: Vec::new(),
            }),
            _ => Err(vec![FieldError::new("", "expected a JSON object")]),
        }
    }

    pub(crate) fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(path, message));
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    /// Like [`Fields::finish`] for builders that yield `None` on failure.
    pub(crate) fn finish_some<T>(mut self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            Some(_) => Err(self.errors),
            None => {
                if self.errors.is_empty() {
                    self.error("", "invalid record");
                }
                Err(self.errors)
            }
        }
    }

    /// The raw value, treating JSON `null` the same as an absent key.
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn explicitly_null(&self, key: &str) -> bool {
        self.map.get(key).is_some_and(Value::is_null)
    }

    // -----------------------------------------------------------------------
    // Strings: stored exactly as sent; blank only counts as missing
    // -----------------------------------------------------------------------

    pub(crate) fn required_string(&mut self, key: &str) -> String {
        match self.present(key) {
            None => {
                self.error(key, "is required");
                String::new()
            }
            Some(v) => self.non_empty_string(key, v).unwrap_or_default(),
        }
    }

    pub(crate) fn optional_string(&mut self, key: &str) -> Option<String> {
        let v = self.present(key)?;
        match v.as_str() {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s.to_string()),
            None => {
                self.error(key, "must be a string");
                None
            }
        }
    }

    pub(crate) fn string_or(&mut self, key: &str, default: &str) -> String {
        self.optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// PATCH accessor for a non-nullable string: absent means "keep".
    pub(crate) fn patch_string(&mut self, key: &str) -> Option<String> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        let v = self.present(key)?;
        self.non_empty_string(key, v)
    }

    /// PATCH accessor for a nullable string: `Some(None)` clears the value.
    #[allow(clippy::option_option)]
    pub(crate) fn patch_nullable_string(&mut self, key: &str) -> Option<Option<String>> {
        if self.explicitly_null(key) {
            return Some(None);
        }
        self.present(key)?;
        Some(self.optional_string(key))
    }

    fn non_empty_string(&mut self, key: &str, v: &Value) -> Option<String> {
        match v.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.to_string()),
            Some(_) => {
                self.error(key, "must not be empty");
                None
            }
            None => {
                self.error(key, "must be a string");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Decimals
    // -----------------------------------------------------------------------

    pub(crate) fn required_decimal(&mut self, key: &str) -> Decimal {
        match self.present(key) {
            None => {
                self.error(key, "is required");
                Decimal::ZERO
            }
            Some(v) => self.non_negative_decimal(key, v).unwrap_or_default(),
        }
    }

    pub(crate) fn optional_decimal(&mut self, key: &str) -> Option<Decimal> {
        let v = self.present(key)?;
        if v.as_str().is_some_and(|s| s.trim().is_empty()) {
            return None;
        }
        self.non_negative_decimal(key, v)
    }

    pub(crate) fn patch_decimal(&mut self, key: &str) -> Option<Decimal> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        let v = self.present(key)?;
        self.non_negative_decimal(key, v)
    }

    #[allow(clippy::option_option)]
    pub(crate) fn patch_nullable_decimal(&mut self, key: &str) -> Option<Option<Decimal>> {
        if self.explicitly_null(key) {
            return Some(None);
        }
        self.present(key)?;
        Some(self.optional_decimal(key))
    }

    /// A required decimal that may be negative.
    pub(crate) fn required_signed_decimal(&mut self, key: &str) -> Option<Decimal> {
        let Some(v) = self.present(key) else {
            self.error(key, "is required");
            return None;
        };
        let parsed = parse_decimal(v);
        if parsed.is_none() {
            self.error(key, "must be a decimal number");
        }
        parsed
    }

    fn non_negative_decimal(&mut self, key: &str, v: &Value) -> Option<Decimal> {
        match parse_decimal(v) {
            Some(d) if d < Decimal::ZERO => {
                self.error(key, "must not be negative");
                None
            }
            Some(d) => Some(d),
            None => {
                self.error(key, "must be a decimal number");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Integers and booleans
    // -----------------------------------------------------------------------

    pub(crate) fn required_id(&mut self, key: &str) -> i64 {
        match self.present(key) {
            None => {
                self.error(key, "is required");
                0
            }
            Some(v) => match parse_integer(v) {
                Some(n) if n >= 1 => n,
                Some(_) => {
                    self.error(key, "must be a positive identifier");
                    0
                }
                None => {
                    self.error(key, "must be an integer");
                    0
                }
            },
        }
    }

    pub(crate) fn patch_id(&mut self, key: &str) -> Option<i64> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        self.present(key)?;
        let id = self.required_id(key);
        (id >= 1).then_some(id)
    }

    /// Integer with a lower bound; absent falls back to `default`.
    pub(crate) fn integer_at_least(&mut self, key: &str, min: i64, default: i64) -> i64 {
        self.patch_integer_at_least(key, min).unwrap_or(default)
    }

    pub(crate) fn required_integer_at_least(&mut self, key: &str, min: i64) -> i64 {
        if self.present(key).is_none() {
            self.error(key, "is required");
            return min;
        }
        self.patch_integer_at_least(key, min).unwrap_or(min)
    }

    pub(crate) fn patch_integer_at_least(&mut self, key: &str, min: i64) -> Option<i64> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        let v = self.present(key)?;
        match parse_integer(v) {
            Some(n) if n >= min => Some(n),
            Some(_) => {
                self.error(key, format!("must be at least {min}"));
                None
            }
            None => {
                self.error(key, "must be an integer");
                None
            }
        }
    }

    pub(crate) fn bool_or(&mut self, key: &str, default: bool) -> bool {
        self.patch_bool(key).unwrap_or(default)
    }

    pub(crate) fn patch_bool(&mut self, key: &str) -> Option<bool> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        let v = self.present(key)?;
        if let Some(b) = v.as_bool() {
            Some(b)
        } else {
            self.error(key, "must be a boolean");
            None
        }
    }

    // -----------------------------------------------------------------------
    // Dates, month partitions and enums
    // -----------------------------------------------------------------------

    pub(crate) fn required_date(&mut self, key: &str) -> Option<NaiveDate> {
        if self.present(key).is_none() {
            self.error(key, "is required");
            return None;
        }
        self.patch_date(key)
    }

    pub(crate) fn optional_date(&mut self, key: &str) -> Option<NaiveDate> {
        let v = self.present(key)?;
        if v.as_str().is_some_and(|s| s.trim().is_empty()) {
            return None;
        }
        self.patch_date(key)
    }

    pub(crate) fn patch_date(&mut self, key: &str) -> Option<NaiveDate> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        let v = self.present(key)?;
        let parsed = v
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        if parsed.is_none() {
            self.error(key, "must be a date formatted YYYY-MM-DD");
        }
        parsed
    }

    #[allow(clippy::option_option)]
    pub(crate) fn patch_nullable_date(&mut self, key: &str) -> Option<Option<NaiveDate>> {
        if self.explicitly_null(key) {
            return Some(None);
        }
        self.present(key)?;
        Some(self.optional_date(key))
    }

    pub(crate) fn optional_timestamp(&mut self, key: &str) -> Option<DateTime<Utc>> {
        let v = self.present(key)?;
        let parsed = v
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if parsed.is_none() {
            self.error(key, "must be an RFC 3339 timestamp");
        }
        parsed
    }

    pub(crate) fn optional_month(&mut self, key: &str) -> Option<String> {
        let month = self.optional_string(key)?;
        if crate::ledger::is_valid_month_partition(&month) {
            Some(month)
        } else {
            self.error(key, "must be a month formatted YYYY-MM");
            None
        }
    }

    /// Parse an enum-like field through `parse`, which reports the accepted values.
    pub(crate) fn patch_enum<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Option<T> {
        if self.explicitly_null(key) {
            self.error(key, "cannot be null");
            return None;
        }
        let v = self.present(key)?;
        let Some(raw) = v.as_str() else {
            self.error(key, "must be a string");
            return None;
        };
        match parse(raw.trim()) {
            Ok(value) => Some(value),
            Err(message) => {
                self.error(key, message);
                None
            }
        }
    }

    pub(crate) fn required_enum<T>(
        &mut self,
        key: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Option<T> {
        if self.present(key).is_none() {
            self.error(key, "is required");
            return None;
        }
        self.patch_enum(key, parse)
    }
}

/// Accept JSON numbers and numeric strings, as sent by forms and CSV imports.
pub(crate) fn parse_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        Value::Number(n) => n.to_string().parse::<Decimal>().ok().or_else(|| {
            n.as_f64()
                .and_then(|f| Decimal::from_f64_retain(f).map(|d| d.normalize()))
        }),
        _ => None,
    }
}

fn parse_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = f as i64;
                    whole
                })
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
