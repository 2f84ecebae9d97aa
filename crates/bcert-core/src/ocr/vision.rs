//! Google Cloud Vision `images:annotate` client.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::service_account::{CachedToken, ServiceAccountKey};
use super::{Credentials, Result, TextRecognizer};
use crate::error::OcrError;
use crate::loader::PageImage;
use crate::models::config::{DetectionFeature, OcrConfig};

/// Client for the Vision API text detection endpoint.
///
/// Each call sends exactly one image and waits for the answer. Requests are
/// never retried.
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    feature: DetectionFeature,
    language_hints: Vec<String>,
    token_cache: Mutex<Option<CachedToken>>,
}

impl VisionClient {
    /// Create a client with explicit credentials.
    pub fn new(config: &OcrConfig, credentials: Credentials) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
            feature: config.feature,
            language_hints: config.language_hints.clone(),
            token_cache: Mutex::new(None),
        })
    }

    /// Create a client, reading credentials from `config.credentials_path`.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let path = config.credentials_path.as_deref().ok_or_else(|| {
            OcrError::Credentials("no credentials file configured".to_string())
        })?;
        let credentials = Credentials::from_file(path)?;
        Self::new(config, credentials)
    }

    /// Bearer token for a service account, reusing the cached one while fresh.
    async fn service_token(&self, key: &ServiceAccountKey) -> Result<String> {
        let cached = match self.token_cache.lock() {
            Ok(cache) => cache
                .as_ref()
                .filter(|token| token.is_fresh())
                .map(|token| token.access_token.clone()),
            Err(_) => None,
        };
        if let Some(token) = cached {
            return Ok(token);
        }

        let token = key.fetch_token(&self.http).await?;
        let access_token = token.access_token.clone();
        if let Ok(mut cache) = self.token_cache.lock() {
            *cache = Some(token);
        }
        Ok(access_token)
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate", self.endpoint)
    }

    fn build_request(&self, page: &PageImage) -> BatchAnnotateRequest {
        let image_context = if self.language_hints.is_empty() {
            None
        } else {
            Some(ImageContext {
                language_hints: self.language_hints.clone(),
            })
        };

        BatchAnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageSource {
                    content: BASE64_STANDARD.encode(&page.data),
                },
                features: vec![Feature {
                    kind: self.feature.as_api_str(),
                }],
                image_context,
            }],
        }
    }
}

#[async_trait]
impl TextRecognizer for VisionClient {
    async fn recognize(&self, page: &PageImage) -> Result<String> {
        let request = self.build_request(page);
        debug!(
            "Sending page {} ({} bytes) for {}",
            page.page,
            page.data.len(),
            self.feature.as_api_str()
        );

        let builder = self.http.post(self.annotate_url()).json(&request);
        let builder = match &self.credentials {
            Credentials::ApiKey(key) => builder.query(&[("key", key)]),
            Credentials::AccessToken(token) => builder.bearer_auth(token),
            Credentials::ServiceAccount(key) => builder.bearer_auth(self.service_token(key).await?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!("Vision response ({}): {} bytes", status, body.len());

        let text = parse_response(status.is_success(), &body).map_err(|e| match e {
            OcrError::InvalidResponse(_) if !status.is_success() => OcrError::Service {
                message: format!("HTTP {}: {}", status, body.trim()),
            },
            other => other,
        })?;

        debug!("Recognized {} characters on page {}", text.len(), page.page);
        Ok(text)
    }
}

/// Interpret an `images:annotate` response body.
///
/// The first text annotation holds the full-page text; no annotation means
/// no text was found.
fn parse_response(success: bool, body: &str) -> Result<String> {
    let parsed: BatchAnnotateResponse = serde_json::from_str(body)
        .map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

    if let Some(status) = parsed.error.filter(|s| !s.message.is_empty()) {
        return Err(OcrError::Service {
            message: status.message,
        });
    }

    if !success {
        return Err(OcrError::InvalidResponse(
            "unsuccessful response without error message".to_string(),
        ));
    }

    let response = parsed
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::InvalidResponse("empty responses list".to_string()))?;

    if let Some(status) = response.error.filter(|s| !s.message.is_empty()) {
        return Err(OcrError::Service {
            message: status.message,
        });
    }

    Ok(response
        .text_annotations
        .into_iter()
        .next()
        .map(|a| a.description)
        .unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct BatchAnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest {
    image: ImageSource,
    features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_context: Option<ImageContext>,
}

#[derive(Debug, Serialize)]
struct ImageSource {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn page(data: &[u8]) -> PageImage {
        PageImage {
            page: 1,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_first_annotation_is_full_text() {
        let body = r#"{"responses": [{"textAnnotations": [
            {"locale": "en", "description": "Name: Jane Doe\nDate of Birth: 1990-05-01\n"},
            {"description": "Name:"},
            {"description": "Jane"}
        ]}]}"#;
        assert_eq!(
            parse_response(true, body).unwrap(),
            "Name: Jane Doe\nDate of Birth: 1990-05-01\n"
        );
    }

    #[test]
    fn test_no_annotations_is_empty_text() {
        assert_eq!(parse_response(true, r#"{"responses": [{}]}"#).unwrap(), "");
    }

    #[test]
    fn test_image_error_message_is_service_error() {
        let body = r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#;
        match parse_response(true, body) {
            Err(OcrError::Service { message }) => assert_eq!(message, "Bad image data."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_error_message_is_ignored() {
        let body = r#"{"responses": [{"error": {"message": ""}, "textAnnotations": [{"description": "x"}]}]}"#;
        assert_eq!(parse_response(true, body).unwrap(), "x");
    }

    #[test]
    fn test_http_level_error() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED"}}"#;
        match parse_response(false, body) {
            Err(OcrError::Service { message }) => assert_eq!(message, "API key not valid."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_request_shape() {
        let mut config = OcrConfig::default();
        config.language_hints = vec!["en".to_string()];
        config.feature = DetectionFeature::DocumentTextDetection;
        let client = VisionClient::new(&config, Credentials::ApiKey("k".to_string())).unwrap();

        let json = serde_json::to_value(client.build_request(&page(b"abc"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "requests": [{
                    "image": {"content": "YWJj"},
                    "features": [{"type": "DOCUMENT_TEXT_DETECTION"}],
                    "imageContext": {"languageHints": ["en"]},
                }]
            })
        );
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let result = VisionClient::from_config(&OcrConfig::default());
        assert!(matches!(result, Err(OcrError::Credentials(_))));
    }

    /// Serve a single HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (endpoint, handle)
    }

    #[tokio::test]
    async fn test_recognize_sends_api_key_and_returns_text() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"responses": [{"textAnnotations": [{"description": "Name: Jane Doe"}]}]}"#,
        )
        .await;

        let mut config = OcrConfig::default();
        config.endpoint = endpoint;
        let client = VisionClient::new(&config, Credentials::ApiKey("secret-key".to_string())).unwrap();

        let text = client.recognize(&page(b"jpeg")).await.unwrap();
        assert_eq!(text, "Name: Jane Doe");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/images:annotate?key=secret-key "));
        assert!(request.contains("\"TEXT_DETECTION\""));
    }

    fn service_account(token_uri: String) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "ocr@certs.iam.gserviceaccount.com".to_string(),
            private_key: include_str!("../../testdata/service_account_key.pem").to_string(),
            private_key_id: None,
            token_uri,
        }
    }

    #[tokio::test]
    async fn test_service_account_token_is_exchanged_and_cached() {
        let (token_endpoint, token_server) = serve_once(
            "200 OK",
            r#"{"access_token": "minted-token", "expires_in": 3599, "token_type": "Bearer"}"#,
        )
        .await;
        let (vision_endpoint, vision_server) = serve_once(
            "200 OK",
            r#"{"responses": [{"textAnnotations": [{"description": "Name: Jane Doe"}]}]}"#,
        )
        .await;

        let mut config = OcrConfig::default();
        config.endpoint = vision_endpoint;
        let key = service_account(format!("{}/token", token_endpoint));
        let client = VisionClient::new(&config, Credentials::ServiceAccount(key)).unwrap();

        assert_eq!(client.recognize(&page(b"jpeg")).await.unwrap(), "Name: Jane Doe");

        let token_request = token_server.await.unwrap();
        assert!(token_request.starts_with("POST /token "));
        assert!(token_request.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"));
        assert!(token_request.contains("assertion=ey"));

        let vision_request = vision_server.await.unwrap();
        assert!(vision_request.to_lowercase().contains("authorization: bearer minted-token"));

        let cached = client.token_cache.lock().unwrap().clone().unwrap();
        assert_eq!(cached.access_token, "minted-token");
        assert!(cached.is_fresh());
    }

    #[tokio::test]
    async fn test_service_account_token_rejection() {
        let (token_endpoint, _server) = serve_once(
            "400 Bad Request",
            r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#,
        )
        .await;

        let key = service_account(format!("{}/token", token_endpoint));
        let client = VisionClient::new(&OcrConfig::default(), Credentials::ServiceAccount(key)).unwrap();

        match client.recognize(&page(b"jpeg")).await.unwrap_err() {
            OcrError::Credentials(message) => assert!(message.contains("Invalid JWT Signature.")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recognize_surfaces_http_error_without_json() {
        let (endpoint, server) = serve_once("503 Service Unavailable", "upstream down").await;

        let mut config = OcrConfig::default();
        config.endpoint = endpoint;
        let client =
            VisionClient::new(&config, Credentials::AccessToken("token".to_string())).unwrap();

        let err = client.recognize(&page(b"jpeg")).await.unwrap_err();
        match err {
            OcrError::Service { message } => assert!(message.contains("503")),
            other => panic!("unexpected error: {:?}", other),
        }

        let request = server.await.unwrap();
        assert!(request.to_lowercase().contains("authorization: bearer token"));
    }
}
