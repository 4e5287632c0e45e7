use async_trait::async_trait;
use serde_json::{Value, json};

use super::google_auth::ServiceAccountAuth;
use super::{LedgerClient, LedgerError, LedgerRow};

pub const API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Appends rows to the first five columns of a named sheet.
pub struct SheetsLedger {
    http_client: reqwest::Client,
    auth: ServiceAccountAuth,
    append_url: String,
}

impl SheetsLedger {
    pub fn new(sheet_id: &str, sheet_name: &str, auth: ServiceAccountAuth) -> Self {
        Self::with_api_base(API_BASE, sheet_id, sheet_name, auth)
    }

    pub fn with_api_base(
        api_base: &str,
        sheet_id: &str,
        sheet_name: &str,
        auth: ServiceAccountAuth,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            auth,
            append_url: append_url(api_base, sheet_id, sheet_name),
        }
    }
}

pub fn append_url(api_base: &str, sheet_id: &str, sheet_name: &str) -> String {
    let range = format!("{}!A:E", sheet_name);
    format!(
        "{}/spreadsheets/{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        api_base.trim_end_matches('/'),
        urlencoding::encode(sheet_id),
        urlencoding::encode(&range)
    )
}

pub fn append_body(row: &LedgerRow) -> Value {
    json!({ "values": [row.values()] })
}

#[async_trait]
impl LedgerClient for SheetsLedger {
    async fn append_row(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http_client
            .post(&self.append_url)
            .bearer_auth(token)
            .json(&append_body(row))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LedgerError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
