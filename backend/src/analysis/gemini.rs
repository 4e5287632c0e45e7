use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::{AnalysisError, ContentAnalyzer};

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiAnalyzer {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl Debug for GeminiAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiAnalyzer")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_api_base(API_BASE.to_string(), api_key, model)
    }

    pub fn with_api_base(api_base: String, api_key: String, model: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_request(bytes: &[u8], content_type: &str, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: content_type.to_string(),
                            data: STANDARD.encode(bytes),
                        },
                    },
                ],
            }],
        }
    }

    fn first_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .filter(|text| !text.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }
}

#[async_trait]
impl ContentAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        bytes: &[u8],
        content_type: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        log::debug!(
            "Sending {} bytes ({}) to {} for analysis",
            bytes.len(),
            content_type,
            self.model
        );
        let body = Self::build_request(bytes, content_type, prompt);

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Self::first_text(parsed)
    }
}
