use crate::app_config::{AppConfig, SourceConfig};
use crate::column::column_index;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_column = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        column_index(&raw).ok_or_else(|| invalid(var, format!("\"{raw}\" is not a column letter")))
    };

    let database_url = require("DATABASE_URL")?;
    let shopify_store_url = require("SHOPIFY_STORE_URL")?;
    let shopify_access_token = require("SHOPIFY_ACCESS_TOKEN")?;
    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2024-01");

    let csv_path = lookup("SHEETSYNC_CSV_PATH").ok().filter(|v| !v.is_empty());
    let spreadsheet_id = lookup("SHEETSYNC_GOOGLE_SPREADSHEET_ID")
        .ok()
        .filter(|v| !v.is_empty());
    let source = match (csv_path, spreadsheet_id) {
        (Some(path), None) => SourceConfig::Csv {
            path: PathBuf::from(path),
        },
        (None, Some(spreadsheet_id)) => SourceConfig::GoogleSheets {
            spreadsheet_id,
            sheet_name: or_default("SHEETSYNC_GOOGLE_SHEET_NAME", "Sheet1"),
            access_token: require("GOOGLE_ACCESS_TOKEN")?,
        },
        (Some(_), Some(_)) => {
            return Err(ConfigError::AmbiguousSource);
        }
        (None, None) => return Err(ConfigError::MissingSource),
    };

    let log_level = or_default("SHEETSYNC_LOG_LEVEL", "info");
    let status_column = parse_column("SHEETSYNC_STATUS_COLUMN", "Z")?;
    let barcode_column = parse_column("SHEETSYNC_BARCODE_COLUMN", "B")?;

    let poll_interval_minutes = parse_u32("SHEETSYNC_POLL_INTERVAL_MINUTES", "5")?;
    if poll_interval_minutes == 0 {
        return Err(invalid(
            "SHEETSYNC_POLL_INTERVAL_MINUTES",
            "must be at least 1".to_string(),
        ));
    }

    let request_timeout_secs = parse_u64("SHEETSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SHEETSYNC_USER_AGENT", "sheetsync/0.1 (catalog-sync)");
    let row_delay_ms = parse_u64("SHEETSYNC_ROW_DELAY_MS", "0")?;
    let lease_ttl_secs = parse_u64("SHEETSYNC_LEASE_TTL_SECS", "600")?;

    let db_max_connections = parse_u32("SHEETSYNC_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("SHEETSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SHEETSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        log_level,
        source,
        shopify_store_url,
        shopify_access_token,
        shopify_api_version,
        status_column,
        barcode_column,
        poll_interval_minutes,
        request_timeout_secs,
        user_agent,
        row_delay_ms,
        lease_ttl_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
