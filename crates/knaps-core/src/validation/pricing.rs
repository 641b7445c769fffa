use rust_decimal::Decimal;
use serde_json::Value;

use super::{FieldError, Fields};
use crate::pricing::{MarginEdit, MarginRequest};

/// Validate a margin calculator body. Errors inside `edit` are reported
/// under `edit.field` and `edit.value`.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_margin_request(value: &Value) -> Result<MarginRequest, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let request = MarginRequest {
        tax_rate: f.optional_decimal("tax_rate"),
        prices_include_tax: f.bool_or("prices_include_tax", true),
        sell_price: f.required_decimal("sell_price"),
        cost_price: f.required_decimal("cost_price"),
        edit: edit_fields(&mut f),
    };
    f.finish(request)
}

fn edit_fields(f: &mut Fields<'_>) -> Option<MarginEdit> {
    let raw = f.present("edit")?;
    let mut edit = match Fields::new(raw) {
        Ok(edit) => edit,
        Err(_) => {
            f.error("edit", "expected a JSON object");
            return None;
        }
    };
    let build = edit.required_enum("field", edit_kind);
    let amount = edit.required_signed_decimal("value");
    f.errors
        .extend(edit.errors.into_iter().map(|e| e.prefixed("edit")));
    let (build, amount) = (build?, amount?);
    Some(build(amount))
}

fn edit_kind(raw: &str) -> Result<fn(Decimal) -> MarginEdit, String> {
    let build: fn(Decimal) -> MarginEdit = match raw {
        "sell_price_incl" => MarginEdit::SellPriceIncl,
        "sell_price_excl" => MarginEdit::SellPriceExcl,
        "cost_price_excl" => MarginEdit::CostPriceExcl,
        "cost_price_incl" => MarginEdit::CostPriceIncl,
        "gross_margin" => MarginEdit::GrossMargin,
        "markup" => MarginEdit::Markup,
        "gross_profit" => MarginEdit::GrossProfit,
        _ => {
            return Err("must be one of sell_price_incl, sell_price_excl, cost_price_excl, \
                        cost_price_incl, gross_margin, markup, gross_profit"
                .to_string())
        }
    };
    Ok(build)
}
