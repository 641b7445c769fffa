pub mod analytics;
pub mod app_config;
pub mod config;
pub mod csv_rows;
pub mod deals;
pub mod ledger;
pub mod price_levels;
pub mod pricing;
pub mod products;
pub mod seed;
pub mod validation;

pub use analytics::{
    turnover_rate, CatalogCounts, LedgerTotals, OverallAnalytics, ProductAnalytics,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use csv_rows::CsvError;
pub use deals::{AmountType, Deal, DealPatch, DealProvider, DealType, NewDeal};
pub use ledger::{
    is_valid_month_partition, month_partition_of, NewSellIn, NewSellThrough, SellIn, SellThrough,
};
pub use price_levels::{
    latest_price_levels, NewPriceLevel, PriceLevel, PriceLevelKind, PriceLevelPatch,
};
pub use pricing::{
    MarginBreakdown, MarginCalculator, MarginEdit, MarginRequest, PricingError, ProductPricing,
    TaxRate,
};
pub use products::{NewProduct, Product, ProductPatch, ProductStatus};
pub use seed::{load_seed, parse_seed, SeedFile, SeedPriceLevel, SeedProduct};
pub use validation::FieldError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),

    #[error("seed file failed validation: {}", validation::describe(.0))]
    SeedValidation(Vec<FieldError>),
}
