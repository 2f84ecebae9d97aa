//! Credentials for the Vision API.

use std::path::Path;

use serde::Deserialize;

use super::Result;
use super::service_account::ServiceAccountKey;
use crate::error::OcrError;

/// How requests to the OCR service are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API key, sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth access token, sent as a bearer token.
    AccessToken(String),
    /// Service-account key, exchanged for short-lived bearer tokens.
    ServiceAccount(ServiceAccountKey),
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: Option<String>,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl Credentials {
    /// Read credentials from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OcrError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse credentials from a service-account key file or JSON holding
    /// `api_key` or `access_token`.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(content)
            .map_err(|e| OcrError::Credentials(format!("malformed credentials file: {}", e)))?;

        if file.kind.as_deref() == Some("service_account") {
            let key: ServiceAccountKey = serde_json::from_str(content).map_err(|e| {
                OcrError::Credentials(format!("malformed service account key: {}", e))
            })?;
            key.encoding_key()?;
            return Ok(Credentials::ServiceAccount(key));
        }

        match file {
            CredentialsFile {
                api_key: Some(key), ..
            } if !key.trim().is_empty() => Ok(Credentials::ApiKey(key.trim().to_string())),
            CredentialsFile {
                access_token: Some(token),
                ..
            } if !token.trim().is_empty() => {
                Ok(Credentials::AccessToken(token.trim().to_string()))
            }
            _ => Err(OcrError::Credentials(
                "credentials file must be a service account key or contain api_key or access_token"
                    .to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credentials::ServiceAccount(key) => {
                write!(f, "ServiceAccount({}, <redacted>)", key.client_email)
            }
        }
    }
}
