use std::path::PathBuf;

/// Where the product table lives.
#[derive(Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// A local CSV file whose first record is the header row.
    Csv { path: PathBuf },
    /// A Google Sheets tab read through the values API.
    GoogleSheets {
        spreadsheet_id: String,
        sheet_name: String,
        access_token: String,
    },
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceConfig::Csv { path } => f.debug_struct("Csv").field("path", path).finish(),
            SourceConfig::GoogleSheets {
                spreadsheet_id,
                sheet_name,
                ..
            } => f
                .debug_struct("GoogleSheets")
                .field("spreadsheet_id", spreadsheet_id)
                .field("sheet_name", sheet_name)
                .field("access_token", &"[redacted]")
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub source: SourceConfig,
    pub shopify_store_url: String,
    pub shopify_access_token: String,
    pub shopify_api_version: String,
    /// Zero-based index of the outcome column (parsed from a letter like `"Z"`).
    pub status_column: usize,
    /// Zero-based index of the barcode column. Informational only.
    pub barcode_column: usize,
    pub poll_interval_minutes: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub row_delay_ms: u64,
    pub lease_ttl_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("source", &self.source)
            .field("shopify_store_url", &self.shopify_store_url)
            .field("shopify_access_token", &"[redacted]")
            .field("shopify_api_version", &self.shopify_api_version)
            .field("status_column", &self.status_column)
            .field("barcode_column", &self.barcode_column)
            .field("poll_interval_minutes", &self.poll_interval_minutes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("row_delay_ms", &self.row_delay_ms)
            .field("lease_ttl_secs", &self.lease_ttl_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
