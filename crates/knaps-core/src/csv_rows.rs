//! Product CSV import and export.
//!
//! Import turns each data row into a JSON object keyed by header name so rows
//! go through the same schema validation as JSON bulk uploads.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::products::Product;

/// Product columns in template order. Headers match the JSON field names.
pub const PRODUCT_COLUMNS: [&str; 26] = [
    "distributor_name",
    "brand_name",
    "product_code",
    "product_secondary_code",
    "product_name",
    "description",
    "summary",
    "shipping_class",
    "category_name",
    "product_availability",
    "status",
    "online",
    "superceded_by",
    "ean",
    "pack_size",
    "core_group",
    "tax_exmt",
    "hyperlink",
    "web_title",
    "features_and_benefits_codes",
    "badges_codes",
    "stock_unmanaged",
    "trade",
    "rrp",
    "mwp",
    "go",
];

const FLAG_COLUMNS: [&str; 3] = ["online", "tax_exmt", "stock_unmanaged"];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV input has no header row")]
    MissingHeader,

    #[error("failed to read CSV header: {0}")]
    Header(#[source] csv::Error),

    #[error("failed to read CSV row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write CSV: {0}")]
    Write(#[source] csv::Error),

    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Header-only CSV for operators to fill in.
#[must_use]
pub fn template() -> String {
    let mut out = PRODUCT_COLUMNS.join(",");
    out.push('\n');
    out
}

/// Parse a product CSV into one JSON object per data row.
///
/// Empty cells are omitted so defaults apply. `pack_size` becomes an integer
/// and the boolean flag columns accept `true/false/yes/no/1/0`; anything that
/// does not parse is kept as a string for the validator to reject.
///
/// # Errors
///
/// Returns [`CsvError`] if the header is missing or a row cannot be read.
pub fn parse_product_csv(input: &str) -> Result<Vec<Value>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = reader.headers().map_err(CsvError::Header)?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(CsvError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| CsvError::Row {
            row: index + 1,
            source,
        })?;
        let mut object = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.is_empty() || cell.is_empty() {
                continue;
            }
            object.insert(header.to_string(), cell_value(header, cell));
        }
        rows.push(Value::Object(object));
    }
    Ok(rows)
}

fn cell_value(header: &str, cell: &str) -> Value {
    if header == "pack_size" {
        if let Ok(n) = cell.parse::<i64>() {
            return Value::from(n);
        }
    } else if FLAG_COLUMNS.contains(&header) {
        if let Some(flag) = parse_flag(cell) {
            return Value::Bool(flag);
        }
    }
    Value::String(cell.to_string())
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Render products as CSV with an `id` column followed by [`PRODUCT_COLUMNS`].
///
/// # Errors
///
/// Returns [`CsvError`] if the writer fails.
pub fn export_products(products: &[Product]) -> Result<String, CsvError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(std::iter::once("id").chain(PRODUCT_COLUMNS))
        .map_err(CsvError::Write)?;
    for product in products {
        writer
            .write_record(product_record(product))
            .map_err(CsvError::Write)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn product_record(product: &Product) -> Vec<String> {
    fn opt<T: ToString>(value: Option<&T>) -> String {
        value.map(ToString::to_string).unwrap_or_default()
    }

    let d = &product.details;
    vec![
        product.id.to_string(),
        d.distributor_name.clone(),
        d.brand_name.clone(),
        d.product_code.clone(),
        opt(d.product_secondary_code.as_ref()),
        d.product_name.clone(),
        opt(d.description.as_ref()),
        opt(d.summary.as_ref()),
        opt(d.shipping_class.as_ref()),
        d.category_name.clone(),
        d.product_availability.clone(),
        d.status.to_string(),
        d.online.to_string(),
        opt(d.superceded_by.as_ref()),
        opt(d.ean.as_ref()),
        d.pack_size.to_string(),
        opt(d.core_group.as_ref()),
        d.tax_exmt.to_string(),
        opt(d.hyperlink.as_ref()),
        opt(d.web_title.as_ref()),
        opt(d.features_and_benefits_codes.as_ref()),
        opt(d.badges_codes.as_ref()),
        d.stock_unmanaged.to_string(),
        d.trade.to_string(),
        d.rrp.to_string(),
        opt(d.mwp.as_ref()),
        opt(d.go.as_ref()),
    ]
}
