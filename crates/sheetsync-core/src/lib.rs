pub mod app_config;
pub mod cell;
pub mod column;
pub mod config;
pub mod products;
pub mod state;

use thiserror::Error;

pub use app_config::{AppConfig, SourceConfig};
pub use cell::CellValue;
pub use column::{column_index, column_letter};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{Product, ProductImage, ProductOption, Variant};
pub use state::{
    load_sync_state, save_sync_state, MemoryStateStore, StateError, StateStore, SyncState,
    LAST_PROCESSED_ROW_KEY, SYNC_LEASE_NAME,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("no source table configured: set SHEETSYNC_CSV_PATH or SHEETSYNC_GOOGLE_SPREADSHEET_ID")]
    MissingSource,

    #[error("both SHEETSYNC_CSV_PATH and SHEETSYNC_GOOGLE_SPREADSHEET_ID are set; pick one")]
    AmbiguousSource,
}
