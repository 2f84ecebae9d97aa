//! Service-account key files and the OAuth token exchange.

use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Result;
use crate::error::OcrError;

/// OAuth scope requested for Vision API calls.
pub const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The parts of a Google service-account key file needed to mint tokens.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Access token obtained from the token endpoint.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl CachedToken {
    /// True while the token can still be sent.
    pub fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

impl ServiceAccountKey {
    /// Parse the private key, failing early on malformed PEM.
    pub fn encoding_key(&self) -> Result<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            OcrError::Credentials(format!("invalid service account private key: {}", e))
        })
    }

    /// Build the signed RS256 JWT assertion for the token exchange.
    pub fn signed_assertion(&self, issued_at: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: VISION_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        encode(&header, &claims, &self.encoding_key()?).map_err(|e| {
            OcrError::Credentials(format!("failed to sign service account assertion: {}", e))
        })
    }

    /// Exchange a freshly signed assertion for an access token.
    pub async fn fetch_token(&self, http: &reqwest::Client) -> Result<CachedToken> {
        let assertion = self.signed_assertion(chrono::Utc::now().timestamp())?;
        debug!("Requesting access token for {}", self.client_email);

        let response = http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            OcrError::Credentials(format!("token exchange failed ({}): {}", status, body.trim()))
        })?;

        match parsed {
            TokenResponse {
                access_token: Some(token),
                expires_in,
                ..
            } if status.is_success() && !token.is_empty() => Ok(CachedToken {
                access_token: token,
                expires_at: Instant::now()
                    + Duration::from_secs(expires_in.unwrap_or(ASSERTION_LIFETIME_SECS as u64)),
            }),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(OcrError::Credentials(format!(
                "token exchange failed ({}): {}",
                status,
                error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_string())
            ))),
        }
    }
}
