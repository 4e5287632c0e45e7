mod orchestrator;

pub use orchestrator::{Enrichment, Receipt, Submission, Submitted, UploadPipeline};

use shared::ErrorKind;

use crate::storage::StorageError;

pub const DEFAULT_UPLOADER: &str = "Anonymous";

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("No file uploaded")]
    MissingFile,
}

/// Failures that reach the caller. Anything after the store succeeds is only logged.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl SubmissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmissionError::Input(_) => ErrorKind::Input,
            SubmissionError::Storage(_) => ErrorKind::Storage,
        }
    }
}
