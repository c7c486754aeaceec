//! Service-account OAuth for the Sheets backend.
//!
//! Signs an RS256 JWT assertion with the account's private key and exchanges
//! it for a short-lived bearer token. Tokens are cached until shortly before
//! they expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use courier_common::error::AppError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (the provider maximum).
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh this long before the cached token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The subset of a service-account key file we need.
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
    /// Parse the key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid service-account credentials: {}", e)))
    }
}

/// Claims of the JWT bearer assertion.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: DateTime<Utc>,
}

/// Issues bearer tokens for the Sheets API.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, client: reqwest::Client) -> Result<Self, AppError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Config(format!("Invalid service-account private key: {}", e)))?;

        Ok(Self {
            key,
            encoding_key,
            client,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Return a valid bearer token, fetching a new one if needed.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref()
            && token.refresh_at > now
        {
            return Ok(token.access_token.clone());
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        let refresh_at = now + Duration::seconds(token.expires_in - EXPIRY_MARGIN_SECS);

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Service-account token refreshed"
        );

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at,
        });
        Ok(token.access_token)
    }

    /// Sign a fresh bearer assertion issued at `now`.
    pub fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = assertion_claims(&self.key, now);
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("Failed to sign assertion: {}", e)))
    }
}

/// Build the assertion claims for `key` issued at `now`.
pub fn assertion_claims(key: &ServiceAccountKey, now: DateTime<Utc>) -> AssertionClaims {
    AssertionClaims {
        iss: key.client_email.clone(),
        scope: SCOPES.to_string(),
        aud: key.token_uri.clone(),
        exp: (now + Duration::seconds(ASSERTION_TTL_SECS)).timestamp(),
        iat: now.timestamp(),
    }
}
