use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

use super::LedgerError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, LedgerError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Auth(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(raw)
            .map_err(|e| LedgerError::Auth(format!("Invalid service account key: {}", e)))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: chrono::DateTime<Utc>,
}

/// Exchanges signed service-account assertions for OAuth access tokens.
pub struct ServiceAccountAuth {
    http_client: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, scope: &str) -> Result<Self, LedgerError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            http_client: reqwest::Client::new(),
            key,
            encoding_key,
            scope: scope.to_string(),
            cached: Mutex::new(None),
        })
    }

    pub fn build_claims(&self, now: chrono::DateTime<Utc>) -> Claims {
        Claims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        }
    }

    fn sign_assertion(&self) -> Result<String, LedgerError> {
        let claims = self.build_claims(Utc::now());
        let header = Header::new(Algorithm::RS256);
        encode(&header, &claims, &self.encoding_key).map_err(LedgerError::Jwt)
    }

    pub async fn access_token(&self) -> Result<String, LedgerError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let assertion = self.sign_assertion()?;
        let response = self
            .http_client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Auth(format!(
                "Token exchange failed with {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        log::debug!("Obtained access token for {}", self.key.client_email);
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });
        Ok(access_token)
    }
}
