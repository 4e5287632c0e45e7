use std::path::PathBuf;

use crate::analysis::AnalysisSettings;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_SHEET_NAME: &str = "Uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Config file error: {0}")]
    File(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Local {
        upload_dir: PathBuf,
    },
    S3 {
        bucket: String,
        public_base_url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerBackend {
    Sheets {
        sheet_id: String,
        sheet_name: String,
        credentials_path: PathBuf,
    },
    DynamoDb {
        table: String,
    },
    None,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub base_url: String,
    pub max_upload_bytes: usize,
    pub storage: StorageBackend,
    pub ledger: LedgerBackend,
    pub gemini_api_key: Option<String>,
    pub analysis: AnalysisSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };
        let base_url = get("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();
        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|_| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                value: raw,
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("local") => StorageBackend::Local {
                upload_dir: PathBuf::from(
                    get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
                ),
            },
            Some("s3") => StorageBackend::S3 {
                bucket: get("S3_BUCKET_NAME").ok_or(ConfigError::Missing("S3_BUCKET_NAME"))?,
                public_base_url: get("S3_PUBLIC_BASE_URL"),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let ledger_backend = get("LEDGER_BACKEND").unwrap_or_else(|| {
            if get("GOOGLE_SHEET_ID").is_some() {
                "sheets".to_string()
            } else {
                "none".to_string()
            }
        });
        let ledger = match ledger_backend.as_str() {
            "sheets" => LedgerBackend::Sheets {
                sheet_id: get("GOOGLE_SHEET_ID").ok_or(ConfigError::Missing("GOOGLE_SHEET_ID"))?,
                sheet_name: get("GOOGLE_SHEET_NAME")
                    .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
                credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS")
                    .or_else(|| get("GOOGLE_CREDENTIALS_PATH"))
                    .map(PathBuf::from)
                    .ok_or(ConfigError::Missing("GOOGLE_APPLICATION_CREDENTIALS"))?,
            },
            "dynamodb" => LedgerBackend::DynamoDb {
                table: get("DYNAMODB_LEDGER_TABLE")
                    .ok_or(ConfigError::Missing("DYNAMODB_LEDGER_TABLE"))?,
            },
            "none" => LedgerBackend::None,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LEDGER_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let mut analysis = match get("ANALYSIS_CONFIG_PATH") {
            Some(path) => AnalysisSettings::load(&PathBuf::from(path))?,
            None => AnalysisSettings::default(),
        };
        if let Some(model) = get("GEMINI_MODEL") {
            analysis.model = model;
        }

        Ok(Self {
            port,
            base_url,
            max_upload_bytes,
            storage,
            ledger,
            gemini_api_key: get("GEMINI_API_KEY"),
            analysis,
        })
    }
}
