use serde_json::Value;

use super::{FieldError, Fields};
use crate::deals::{AmountType, DealPatch, DealProvider, DealType, NewDeal};
use crate::ledger::month_partition_of;

/// # Errors
///
/// Returns every field error found.
pub fn validate_new_deal(value: &Value) -> Result<NewDeal, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let deal = deal_fields(&mut f, None);
    f.finish_some(deal)
}

/// Validate a partial deal update. Date-range consistency against the stored
/// deal is checked when the patch is applied.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_deal_patch(value: &Value) -> Result<DealPatch, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let patch = DealPatch {
        product_id: f.patch_id("product_id"),
        deal_type: f.patch_enum("deal_type", DealType::parse),
        amount_type: f.patch_enum("amount_type", AmountType::parse),
        amount: f.patch_decimal("amount"),
        start_date: f.patch_date("start_date"),
        end_date: f.patch_date("end_date"),
        month_partition: f.optional_month("month_partition"),
        provider: f.patch_enum("provider", DealProvider::parse),
        store_amount: f.patch_nullable_decimal("store_amount"),
        head_office_amount: f.patch_nullable_decimal("head_office_amount"),
        trade_price: f.patch_nullable_decimal("trade_price"),
    };
    if let (Some(start), Some(end)) = (patch.start_date, patch.end_date) {
        if end < start {
            f.error("end_date", "must not be before start_date");
        }
    }
    f.finish(patch)
}

pub(crate) fn deal_fields(f: &mut Fields<'_>, product_id: Option<i64>) -> Option<NewDeal> {
    let product_id = product_id.unwrap_or_else(|| f.required_id("product_id"));
    let deal_type = f.required_enum("deal_type", DealType::parse);
    let amount_type = f.required_enum("amount_type", AmountType::parse);
    let amount = f.required_decimal("amount");
    let start_date = f.required_date("start_date");
    let end_date = f.required_date("end_date");
    let month_partition = f.optional_month("month_partition");
    let provider = f.required_enum("provider", DealProvider::parse);
    let store_amount = f.optional_decimal("store_amount");
    let head_office_amount = f.optional_decimal("head_office_amount");
    let trade_price = f.optional_decimal("trade_price");

    let (start_date, end_date) = (start_date?, end_date?);
    if end_date < start_date {
        f.error("end_date", "must not be before start_date");
        return None;
    }

    Some(NewDeal {
        product_id,
        deal_type: deal_type?,
        amount_type: amount_type?,
        amount,
        start_date,
        end_date,
        month_partition: month_partition.unwrap_or_else(|| month_partition_of(start_date)),
        provider: provider?,
        store_amount,
        head_office_amount,
        trade_price,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn body() -> Value {
        json!({
            "product_id": 1,
            "deal_type": "sell_through",
            "amount_type": "value",
            "amount": "50.00",
            "start_date": "2024-03-01",
            "end_date": "2024-03-31",
            "provider": "head office"
        })
    }

    #[test]
    fn parses_deal_and_defaults_month() {
        let deal = validate_new_deal(&body()).unwrap();
        assert_eq!(deal.deal_type, DealType::SellThrough);
        assert_eq!(deal.amount_type, AmountType::Value);
        assert_eq!(deal.provider, DealProvider::HeadOffice);
        assert_eq!(deal.amount, Decimal::new(5000, 2));
        assert_eq!(deal.month_partition, "2024-03");
        assert_eq!(deal.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn explicit_month_is_kept() {
        let mut b = body();
        b["month_partition"] = json!("2024-04");
        assert_eq!(validate_new_deal(&b).unwrap().month_partition, "2024-04");
    }

    #[test]
    fn rejects_inverted_dates() {
        let mut b = body();
        b["end_date"] = json!("2024-02-28");
        let errors = validate_new_deal(&b).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("end_date", "must not be before start_date")]);
    }

    #[test]
    fn rejects_unknown_enums() {
        let mut b = body();
        b["deal_type"] = json!("rebate");
        b["provider"] = json!("supplier");
        let errors = validate_new_deal(&b).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["deal_type", "provider"]);
    }

    #[test]
    fn patch_clears_optional_amount() {
        let patch = validate_deal_patch(&json!({ "trade_price": null, "amount": 10 })).unwrap();
        assert_eq!(patch.trade_price, Some(None));
        assert_eq!(patch.amount, Some(Decimal::TEN));
        assert_eq!(patch.provider, None);
    }

    #[test]
    fn patch_checks_range_when_both_dates_given() {
        let errors = validate_deal_patch(&json!({
            "start_date": "2024-05-01",
            "end_date": "2024-04-01"
        }))
        .unwrap_err();
        assert_eq!(errors[0].path, "end_date");
    }
}
