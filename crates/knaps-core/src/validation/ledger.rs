use chrono::NaiveDate;
use serde_json::Value;

use super::{FieldError, Fields};
use crate::ledger::{month_partition_of, NewSellIn, NewSellThrough};

/// # Errors
///
/// Returns every field error found.
pub fn validate_new_sell_in(value: &Value) -> Result<NewSellIn, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let entry = sell_in_fields(&mut f, None);
    f.finish_some(entry)
}

/// # Errors
///
/// Returns every field error found.
pub fn validate_new_sell_through(value: &Value) -> Result<NewSellThrough, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let entry = sell_through_fields(&mut f, None);
    f.finish_some(entry)
}

/// Read a sell-in row. `product_id` overrides the body when the owner is
/// already known, as for rows nested under a seeded product.
pub(crate) fn sell_in_fields(f: &mut Fields<'_>, product_id: Option<i64>) -> Option<NewSellIn> {
    let product_id = product_id.unwrap_or_else(|| f.required_id("product_id"));
    let quantity = f.required_integer_at_least("quantity", 0);
    let unit_cost = f.required_decimal("unit_cost");
    let total_cost = f.required_decimal("total_cost");
    let notes = f.optional_string("notes");
    let (transaction_date, month_partition) = dated(f)?;
    Some(NewSellIn {
        product_id,
        quantity,
        unit_cost,
        total_cost,
        transaction_date,
        month_partition,
        notes,
    })
}

pub(crate) fn sell_through_fields(
    f: &mut Fields<'_>,
    product_id: Option<i64>,
) -> Option<NewSellThrough> {
    let product_id = product_id.unwrap_or_else(|| f.required_id("product_id"));
    let quantity = f.required_integer_at_least("quantity", 0);
    let unit_price = f.required_decimal("unit_price");
    let total_revenue = f.required_decimal("total_revenue");
    let customer_info = f.optional_string("customer_info");
    let (transaction_date, month_partition) = dated(f)?;
    Some(NewSellThrough {
        product_id,
        quantity,
        unit_price,
        total_revenue,
        transaction_date,
        month_partition,
        customer_info,
    })
}

/// Transaction date plus its partition. A supplied `month_partition` must
/// agree with the date; an omitted one is derived from it.
fn dated(f: &mut Fields<'_>) -> Option<(NaiveDate, String)> {
    let date = f.required_date("transaction_date");
    let supplied = f.optional_month("month_partition");
    let date = date?;
    let derived = month_partition_of(date);
    match supplied {
        Some(month) if month != derived => {
            f.error(
                "month_partition",
                format!("must match transaction_date ({derived})"),
            );
            None
        }
        _ => Some((date, derived)),
    }
}
