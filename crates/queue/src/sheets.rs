//! Google Sheets backed job queue.
//!
//! Row 1 of the sheet is a header. The pending job is always row 2, read as
//! the fixed range `A2:D2` and removed with a `deleteDimension` batch update
//! so the rows below shift up.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use courier_common::config::AppConfig;
use courier_common::error::AppError;
use courier_common::traits::QueueStore;
use courier_common::types::QueueRow;

use crate::auth::{ServiceAccountAuth, ServiceAccountKey};

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Response body of `spreadsheets.values.get`.
#[derive(Debug, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Option<Vec<Vec<serde_json::Value>>>,
}

impl ValueRange {
    /// Turn the first returned row into a queue row.
    pub fn into_first_row(self) -> Option<QueueRow> {
        let row = self.values?.into_iter().next()?;
        QueueRow::from_cells(row.into_iter().map(cell_text))
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Queue client over one sheet of one spreadsheet.
pub struct SheetsQueue {
    client: reqwest::Client,
    auth: ServiceAccountAuth,
    api_base: String,
    spreadsheet_id: String,
    sheet_name: String,
    sheet_id: i64,
}

impl SheetsQueue {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::new();
        let key = ServiceAccountKey::from_json(&config.google_credentials)?;
        let auth = ServiceAccountAuth::new(key, client.clone())?;

        tracing::info!(
            spreadsheet_id = %config.spreadsheet_id,
            sheet = %config.sheet_name,
            client_email = %auth.client_email(),
            "Sheets queue configured"
        );

        Ok(Self {
            client,
            auth,
            api_base: DEFAULT_API_BASE.to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            sheet_id: config.sheet_id,
        })
    }

    /// Point the client at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// A1 range of the row right after the header.
    pub fn first_row_range(&self) -> String {
        first_row_range(&self.sheet_name)
    }

    fn values_url(&self) -> Result<Url, AppError> {
        spreadsheet_url(
            &self.api_base,
            &[
                self.spreadsheet_id.as_str(),
                "values",
                self.first_row_range().as_str(),
            ],
        )
    }

    fn batch_update_url(&self) -> Result<Url, AppError> {
        spreadsheet_url(
            &self.api_base,
            &[format!("{}:batchUpdate", self.spreadsheet_id).as_str()],
        )
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Queue(format!("Sheets API returned {}: {}", status, body)))
    }
}

#[async_trait]
impl QueueStore for SheetsQueue {
    async fn read_first_row(&self) -> Result<Option<QueueRow>, AppError> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .get(self.values_url()?)
            .bearer_auth(token)
            .send()
            .await?;

        let range: ValueRange = Self::ensure_success(response).await?.json().await?;
        let row = range.into_first_row();

        tracing::debug!(has_row = row.is_some(), "Read first queue row");
        Ok(row)
    }

    async fn delete_first_row(&self) -> Result<(), AppError> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(self.batch_update_url()?)
            .bearer_auth(token)
            .json(&delete_first_row_request(self.sheet_id))
            .send()
            .await?;

        Self::ensure_success(response).await?;

        tracing::info!(sheet_id = self.sheet_id, "Queue row deleted");
        Ok(())
    }
}

/// Quote the sheet name so names with spaces or punctuation stay valid A1.
pub fn first_row_range(sheet_name: &str) -> String {
    format!("'{}'!A2:D2", sheet_name.replace('\'', "''"))
}

/// Batch-update body removing the row right after the header.
pub fn delete_first_row_request(sheet_id: i64) -> serde_json::Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": 1,
                    "endIndex": 2
                }
            }
        }]
    })
}

fn spreadsheet_url(api_base: &str, tail: &[&str]) -> Result<Url, AppError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| AppError::Config(format!("Invalid Sheets API base URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config("Sheets API base URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets"])
        .extend(tail);
    Ok(url)
}
