use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::deals::NewDeal;
use crate::ledger::{NewSellIn, NewSellThrough};
use crate::price_levels::NewPriceLevel;
use crate::products::NewProduct;
use crate::validation::{
    deal_fields, price_level_fields, sell_in_fields, sell_through_fields, validate_new_product,
    FieldError, Fields,
};
use crate::ConfigError;

/// A validated seed file. Nested rows carry a placeholder `product_id`
/// that the store replaces with the id it assigns to the owning product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedFile {
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedProduct {
    pub product: NewProduct,
    pub price_levels: Vec<SeedPriceLevel>,
    pub deals: Vec<NewDeal>,
    pub sell_ins: Vec<NewSellIn>,
    pub sell_throughs: Vec<NewSellThrough>,
}

/// Price level with optional historical timestamps, so seeded data can
/// exercise latest-level selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPriceLevel {
    pub level: NewPriceLevel,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Load and validate a YAML seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_seed(&content)
}

/// Parse seed YAML. Every row is validated with the same rules as the HTTP
/// API; all errors are reported with paths like `products.1.deals.0.amount`.
///
/// # Errors
///
/// Returns `ConfigError::SeedFileParse` for malformed YAML and
/// `ConfigError::SeedValidation` for schema violations or duplicate codes.
pub fn parse_seed(input: &str) -> Result<SeedFile, ConfigError> {
    let root: Value = serde_yaml::from_str(input)?;
    let Some(items) = root.get("products").and_then(Value::as_array) else {
        return Err(ConfigError::SeedValidation(vec![FieldError::new(
            "products",
            "must be a list",
        )]));
    };

    let mut errors = Vec::new();
    let mut seen_codes: HashMap<String, usize> = HashMap::new();
    let mut products = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let prefix = format!("products.{i}");
        let product = match validate_new_product(item) {
            Ok(product) => Some(product),
            Err(errs) => {
                errors.extend(errs.into_iter().map(|e| e.prefixed(&prefix)));
                None
            }
        };

        let price_levels = nested(item, "price_levels", &prefix, &mut errors, |f| {
            let level = price_level_fields(f, 0);
            let created_at = f.optional_timestamp("created_at");
            let updated_at = f.optional_timestamp("updated_at");
            level.map(|level| SeedPriceLevel {
                level,
                created_at,
                updated_at,
            })
        });
        let deals = nested(item, "deals", &prefix, &mut errors, |f| deal_fields(f, Some(0)));
        let sell_ins = nested(item, "sell_ins", &prefix, &mut errors, |f| {
            sell_in_fields(f, Some(0))
        });
        let sell_throughs = nested(item, "sell_throughs", &prefix, &mut errors, |f| {
            sell_through_fields(f, Some(0))
        });

        let Some(product) = product else { continue };
        if let Some(first) = seen_codes.get(&product.product_code) {
            errors.push(FieldError::new(
                format!("{prefix}.product_code"),
                format!("duplicates products.{first}.product_code"),
            ));
        } else {
            seen_codes.insert(product.product_code.clone(), i);
        }
        products.push(SeedProduct {
            product,
            price_levels,
            deals,
            sell_ins,
            sell_throughs,
        });
    }

    if errors.is_empty() {
        Ok(SeedFile { products })
    } else {
        Err(ConfigError::SeedValidation(errors))
    }
}

fn nested<T>(
    item: &Value,
    key: &str,
    prefix: &str,
    errors: &mut Vec<FieldError>,
    read: impl Fn(&mut Fields<'_>) -> Option<T>,
) -> Vec<T> {
    let entries = match item.get(key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            errors.push(FieldError::new(format!("{prefix}.{key}"), "must be a list"));
            return Vec::new();
        }
    };

    let mut rows = Vec::with_capacity(entries.len());
    for (j, entry) in entries.iter().enumerate() {
        let path = format!("{prefix}.{key}.{j}");
        let result = Fields::new(entry).and_then(|mut f| {
            let row = read(&mut f);
            f.finish_some(row)
        });
        match result {
            Ok(row) => rows.push(row),
            Err(errs) => errors.extend(errs.into_iter().map(|e| e.prefixed(&path))),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
products:
  - distributor_name: Sony Australia
    brand_name: Sony
    product_code: TV-100
    product_name: Bravia 55in OLED
    category_name: Televisions
    trade: "1500.00"
    rrp: "2499.00"
    price_levels:
      - price_level: Trade
        value_excl: "1363.64"
        created_at: "2024-01-01T00:00:00Z"
      - price_level: RRP
        value_excl: "2271.82"
        value_incl: "2499.00"
        created_at: "2024-01-01T00:00:00Z"
        updated_at: "2024-02-01T00:00:00Z"
    deals:
      - deal_type: sell_through
        amount_type: value
        amount: "50.00"
        start_date: "2024-03-01"
        end_date: "2024-03-31"
        provider: head office
    sell_ins:
      - quantity: 50
        unit_cost: "150.00"
        total_cost: "7500.00"
        transaction_date: "2024-03-02"
    sell_throughs:
      - quantity: 30
        unit_price: "300.00"
        total_revenue: "9000.00"
        transaction_date: "2024-03-20"
  - distributor_name: Sony Australia
    brand_name: Sony
    product_code: SB-200
    product_name: Soundbar
    category_name: Audio
    trade: 400
    rrp: 599
"#;

    #[test]
    fn parses_products_and_nested_rows() {
        let seed = parse_seed(SEED).unwrap();
        assert_eq!(seed.products.len(), 2);
        let tv = &seed.products[0];
        assert_eq!(tv.product.product_code, "TV-100");
        assert_eq!(tv.price_levels.len(), 2);
        assert!(tv.price_levels[1].updated_at.is_some());
        assert_eq!(tv.deals[0].month_partition, "2024-03");
        assert_eq!(tv.sell_ins[0].quantity, 50);
        assert_eq!(tv.sell_throughs[0].month_partition, "2024-03");
        assert!(seed.products[1].deals.is_empty());
    }

    #[test]
    fn reports_nested_errors_with_paths() {
        let yaml = r#"
products:
  - distributor_name: D
    brand_name: B
    product_code: X-1
    product_name: X
    category_name: C
    trade: 1
    rrp: 2
    sell_ins:
      - quantity: -4
        unit_cost: 1
        total_cost: 1
        transaction_date: "2024-03-01"
"#;
        let Err(ConfigError::SeedValidation(errors)) = parse_seed(yaml) else {
            panic!("expected seed validation error");
        };
        assert_eq!(errors[0].path, "products.0.sell_ins.0.quantity");
    }

    #[test]
    fn rejects_duplicate_codes() {
        let yaml = r"
products:
  - { distributor_name: D, brand_name: B, product_code: X-1, product_name: X, category_name: C, trade: 1, rrp: 2 }
  - { distributor_name: D, brand_name: B, product_code: X-1, product_name: Y, category_name: C, trade: 1, rrp: 2 }
";
        let err = parse_seed(yaml).unwrap_err();
        assert!(
            err.to_string().contains("products.1.product_code: duplicates products.0.product_code"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn requires_products_list() {
        let err = parse_seed("widgets: []").unwrap_err();
        assert!(matches!(err, ConfigError::SeedValidation(_)));
    }

    #[test]
    fn load_seed_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("seed.yaml");
        let seed = load_seed(&path).expect("failed to load seed.yaml");
        assert!(
            !seed.products.is_empty(),
            "seed.yaml should contain at least one product"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_seed(Path::new("/nonexistent/seed.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::SeedFileIo { .. }));
    }
}
