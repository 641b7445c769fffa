use serde_json::Value;

use super::{FieldError, Fields};
use crate::price_levels::{NewPriceLevel, PriceLevelKind, PriceLevelPatch};

/// Validate a create body for a price level owned by `product_id`.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_new_price_level(
    product_id: i64,
    value: &Value,
) -> Result<NewPriceLevel, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let level = price_level_fields(&mut f, product_id);
    f.finish_some(level)
}

/// # Errors
///
/// Returns every field error found.
pub fn validate_price_level_patch(value: &Value) -> Result<PriceLevelPatch, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let patch = PriceLevelPatch {
        price_level: f.patch_enum("price_level", PriceLevelKind::parse),
        level_type: f.patch_string("type"),
        value_excl: f.patch_decimal("value_excl"),
        value_incl: f.patch_nullable_decimal("value_incl"),
        comments: f.patch_nullable_string("comments"),
        valid_start: f.patch_nullable_date("valid_start"),
        valid_end: f.patch_nullable_date("valid_end"),
    };
    if let (Some(Some(start)), Some(Some(end))) = (patch.valid_start, patch.valid_end) {
        if end < start {
            f.error("valid_end", "must not be before valid_start");
        }
    }
    f.finish(patch)
}

pub(crate) fn price_level_fields(f: &mut Fields<'_>, product_id: i64) -> Option<NewPriceLevel> {
    let price_level = f.required_enum("price_level", PriceLevelKind::parse);
    let level_type = f.string_or("type", "Standard");
    let value_excl = f.required_decimal("value_excl");
    let value_incl = f.optional_decimal("value_incl");
    let comments = f.optional_string("comments");
    let valid_start = f.optional_date("valid_start");
    let valid_end = f.optional_date("valid_end");

    if let (Some(start), Some(end)) = (valid_start, valid_end) {
        if end < start {
            f.error("valid_end", "must not be before valid_start");
            return None;
        }
    }

    Some(NewPriceLevel {
        product_id,
        price_level: price_level?,
        level_type,
        value_excl,
        value_incl,
        comments,
        valid_start,
        valid_end,
    })
}
