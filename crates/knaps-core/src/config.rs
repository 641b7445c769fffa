use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use rust_decimal::Decimal;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("KNAPS_ENV", "development"));
    let bind_addr = parse_addr("KNAPS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("KNAPS_LOG_LEVEL", "info");
    let seed_path = lookup("KNAPS_SEED_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let default_tax_rate = or_default("KNAPS_DEFAULT_TAX_RATE", "10")
        .trim()
        .parse::<Decimal>()
        .map_err(|e| invalid("KNAPS_DEFAULT_TAX_RATE", e.to_string()))?;
    if default_tax_rate < Decimal::ZERO || default_tax_rate >= Decimal::ONE_HUNDRED {
        return Err(invalid(
            "KNAPS_DEFAULT_TAX_RATE",
            format!("tax rate must be in [0, 100), got {default_tax_rate}"),
        ));
    }

    let api_keys = or_default("KNAPS_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let rate_limit_max_requests = parse_usize("KNAPS_RATE_LIMIT_MAX_REQUESTS", "120")?;
    let rate_limit_window_secs = parse_u64("KNAPS_RATE_LIMIT_WINDOW_SECS", "60")?;
    if rate_limit_window_secs == 0 {
        return Err(invalid(
            "KNAPS_RATE_LIMIT_WINDOW_SECS",
            "window must be at least one second".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        seed_path,
        default_tax_rate,
        api_keys,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
