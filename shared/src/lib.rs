use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay};

/// Short human-shareable code handed back for every stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct TrackerId(String);

impl TrackerId {
    pub const LEN: usize = 7;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exactly `LEN` characters from `[A-Za-z0-9]`.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN && self.0.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

/// Failure classes a caller of the upload endpoint can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Input,
    Storage,
    Analysis,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
    pub tracker_id: TrackerId,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}
