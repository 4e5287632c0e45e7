use chrono::{DateTime, Utc};
use shared::TrackerId;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use super::{DEFAULT_UPLOADER, InputError, SubmissionError};
use crate::analysis::ContentAnalyzer;
use crate::ledger::{LedgerClient, LedgerRow};
use crate::storage::ObjectStore;
use crate::tracker;

/// One upload request, alive only for the duration of its pipeline run.
#[derive(Debug, Clone)]
pub struct Submission {
    bytes: Vec<u8>,
    uploader: String,
    content_type: String,
}

impl Submission {
    /// Blank or missing uploader names become `DEFAULT_UPLOADER`.
    pub fn new(bytes: Vec<u8>, uploader: Option<String>, content_type: impl Into<String>) -> Self {
        let uploader = uploader
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOADER.to_string());
        Self {
            bytes,
            uploader,
            content_type: content_type.into(),
        }
    }

    pub fn uploader(&self) -> &str {
        &self.uploader
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub retrieval_url: String,
    pub tracker_id: TrackerId,
}

pub struct Submitted {
    pub receipt: Receipt,
    pub enrichment: Enrichment,
}

/// Handle to the analysis + ledger work spawned after the store succeeded.
/// Dropping or detaching it leaves the task running.
pub struct Enrichment {
    handle: JoinHandle<()>,
}

impl Enrichment {
    pub fn detach(self) {
        drop(self.handle);
    }

    pub async fn join(self) -> Result<(), JoinError> {
        self.handle.await
    }
}

#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn ObjectStore>,
    analyzer: Option<Arc<dyn ContentAnalyzer>>,
    ledger: Option<Arc<dyn LedgerClient>>,
    prompt: Arc<str>,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        analyzer: Option<Arc<dyn ContentAnalyzer>>,
        ledger: Option<Arc<dyn LedgerClient>>,
        prompt: &str,
    ) -> Self {
        Self {
            store,
            analyzer,
            ledger,
            prompt: Arc::from(prompt),
        }
    }

    pub fn analyzer(&self) -> Option<&Arc<dyn ContentAnalyzer>> {
        self.analyzer.as_ref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Stores the upload and returns as soon as it is durable.
    /// Analysis and ledgering continue on a spawned task whose failures are only logged.
    pub async fn submit(&self, submission: Submission) -> Result<Submitted, SubmissionError> {
        if submission.bytes.is_empty() {
            return Err(InputError::MissingFile.into());
        }

        let tracker_id = tracker::generate();
        let received_at = Utc::now();

        let asset = self
            .store
            .put(&submission.bytes, &submission.content_type)
            .await
            .map_err(|e| {
                log::error!("Storing upload {} failed: {}", tracker_id, e);
                SubmissionError::Storage(e)
            })?;

        log::info!("Upload {} stored as {} ({})", tracker_id, asset.key, asset.url);
        let receipt = Receipt {
            retrieval_url: asset.url,
            tracker_id,
        };

        let continuation = Continuation {
            submission,
            receipt: receipt.clone(),
            received_at,
            analyzer: self.analyzer.clone(),
            ledger: self.ledger.clone(),
            prompt: self.prompt.clone(),
        };
        let handle = tokio::spawn(continuation.run());

        Ok(Submitted {
            receipt,
            enrichment: Enrichment { handle },
        })
    }
}

struct Continuation {
    submission: Submission,
    receipt: Receipt,
    received_at: DateTime<Utc>,
    analyzer: Option<Arc<dyn ContentAnalyzer>>,
    ledger: Option<Arc<dyn LedgerClient>>,
    prompt: Arc<str>,
}

impl Continuation {
    async fn run(self) {
        let tracker_id = &self.receipt.tracker_id;

        let analysis = match &self.analyzer {
            Some(analyzer) => match analyzer
                .analyze(&self.submission.bytes, &self.submission.content_type, &self.prompt)
                .await
            {
                Ok(text) => Some(text),
                Err(e) => {
                    log::error!("Analysis for upload {} failed: {}", tracker_id, e);
                    None
                }
            },
            None => {
                log::debug!("No analyzer configured, skipping analysis for {}", tracker_id);
                None
            }
        };

        let row = LedgerRow {
            date: self.received_at,
            file_url: self.receipt.retrieval_url.clone(),
            tracker_id: tracker_id.clone(),
            uploader: self.submission.uploader().to_string(),
            analysis,
        };

        match &self.ledger {
            Some(ledger) => match ledger.append_row(&row).await {
                Ok(()) => log::info!("Ledger row appended for upload {}", tracker_id),
                Err(e) => log::error!("Ledger append for upload {} failed: {}", tracker_id, e),
            },
            None => log::warn!("No ledger configured, upload {} was not recorded", tracker_id),
        }
    }
}
