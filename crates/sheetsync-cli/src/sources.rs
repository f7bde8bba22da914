//! Builds the sheet source and catalog client from configuration.

use std::sync::Arc;

use sheetsync_catalog::ShopifyAdminClient;
use sheetsync_core::{AppConfig, SourceConfig};
use sheetsync_sheets::{CsvSheet, GoogleSheet, SheetSource};

pub(crate) fn build_sheet(config: &AppConfig) -> anyhow::Result<Arc<dyn SheetSource>> {
    let sheet: Arc<dyn SheetSource> = match &config.source {
        SourceConfig::Csv { path } => Arc::new(CsvSheet::new(path.clone())),
        SourceConfig::GoogleSheets {
            spreadsheet_id,
            sheet_name,
            access_token,
        } => Arc::new(GoogleSheet::new(
            spreadsheet_id,
            sheet_name,
            access_token,
            config.request_timeout_secs,
            &config.user_agent,
        )?),
    };
    tracing::debug!(sheet = %sheet.describe(), "sheet source ready");
    Ok(sheet)
}

pub(crate) fn build_catalog(config: &AppConfig) -> anyhow::Result<ShopifyAdminClient> {
    let client = ShopifyAdminClient::new(
        &config.shopify_store_url,
        &config.shopify_access_token,
        &config.shopify_api_version,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    tracing::debug!(endpoint = client.endpoint(), "catalog client ready");
    Ok(client)
}
