pub mod dynamodb;
pub mod google_auth;
pub mod sheets;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use shared::TrackerId;

pub use dynamodb::DynamoLedger;
pub use sheets::SheetsLedger;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Ledger API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("JWT signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
}

/// One append-only provenance record. Column names are read by name downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub date: DateTime<Utc>,
    pub file_url: String,
    pub tracker_id: TrackerId,
    pub uploader: String,
    pub analysis: Option<String>,
}

impl LedgerRow {
    pub const COLUMNS: [&'static str; 5] = ["Date", "File_URL", "Tracker_ID", "Uploader", "Analysis"];

    pub fn date_string(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Cell values in `COLUMNS` order; a missing analysis is an empty cell.
    pub fn values(&self) -> [String; 5] {
        [
            self.date_string(),
            self.file_url.clone(),
            self.tracker_id.to_string(),
            self.uploader.clone(),
            self.analysis.clone().unwrap_or_default(),
        ]
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn append_row(&self, row: &LedgerRow) -> Result<(), LedgerError>;
}
