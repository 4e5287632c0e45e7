pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use gemini::GeminiAnalyzer;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Asks for six labelled fields; the reply is stored as-is, never parsed.
pub const DEFAULT_PROMPT: &str = "\
Analyze the provided image and provide only the following structured output:
Name: (Image name based on content)
Artist: (If unknown, write \"Unknown\")
AI Identification Score: (Score out of 100 and confidence level)
Originality Score: (Score out of 100 and confidence level)
Conclusion: (One sentence stating if it's AI-generated or original)
Description: (Brief description of image content)";

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Model returned no text")]
    EmptyResponse,
}

#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        bytes: &[u8],
        content_type: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError>;
}

/// Optional YAML override for the analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            prompt: default_prompt(),
        }
    }
}

impl AnalysisSettings {
    pub fn load(path: &Path) -> Result<Self, crate::config::ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::config::ConfigError::File(format!("{}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, crate::config::ConfigError> {
        serde_yaml::from_str(raw).map_err(|e| crate::config::ConfigError::File(e.to_string()))
    }
}
