//! Google Sheets source backed by the v4 `values` REST API.
//!
//! Reads use `valueRenderOption=UNFORMATTED_VALUE` so checkboxes arrive as
//! booleans and numeric cells as numbers. Each outcome is written straight
//! through with a single-cell `PUT`; there is nothing to flush.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use sheetsync_core::{column_letter, CellValue};

use crate::error::SheetError;
use crate::table::SheetTable;
use crate::SheetSource;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<CellValue>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// One tab of a Google spreadsheet.
pub struct GoogleSheet {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
}

impl GoogleSheet {
    /// Creates a source pointed at the production Sheets API.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        spreadsheet_id: &str,
        sheet_name: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SheetError> {
        Self::with_base_url(
            spreadsheet_id,
            sheet_name,
            access_token,
            timeout_secs,
            user_agent,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a source with a custom API base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Http`] if the client cannot be constructed, or
    /// [`SheetError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        spreadsheet_id: &str,
        sheet_name: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SheetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SheetError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.to_owned(),
            sheet_name: sheet_name.to_owned(),
            access_token: access_token.to_owned(),
        })
    }

    /// A1 range for the whole tab, quoted so names with spaces survive.
    fn sheet_range(&self) -> String {
        format!("'{}'", self.sheet_name.replace('\'', "''"))
    }

    fn cell_range(&self, row: u32, column: usize) -> String {
        format!("{}!{}{row}", self.sheet_range(), column_letter(column))
    }

    /// Builds `v4/spreadsheets/{id}/values/{range}`, percent-encoding the range.
    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SheetError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(SheetError::UnexpectedStatus {
            status: status.as_u16(),
            url,
            body,
        })
    }
}

#[async_trait]
impl SheetSource for GoogleSheet {
    async fn read_table(&self) -> Result<SheetTable, SheetError> {
        let mut url = self.values_url(&self.sheet_range())?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("majorDimension", "ROWS");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;

        let parsed: ValueRange =
            serde_json::from_str(&body).map_err(|e| SheetError::Deserialize {
                context: format!("values of sheet {}", self.sheet_name),
                source: e,
            })?;

        // The API returns "" for empty cells inside the data range.
        let grid = parsed
            .values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        CellValue::Text(s) if s.is_empty() => CellValue::Empty,
                        other => other,
                    })
                    .collect()
            })
            .collect();

        Ok(SheetTable::from_grid(grid))
    }

    async fn write_outcome(&self, row: u32, column: usize, text: &str) -> Result<(), SheetError> {
        if row < 2 {
            return Err(SheetError::RowOutOfRange { row });
        }
        let range = self.cell_range(row, column);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueUpdate {
            range: &range,
            major_dimension: "ROWS",
            values: [[text]],
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("google-sheets:{}/{}", self.spreadsheet_id, self.sheet_name)
    }
}
