use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::application::use_cases::session::SessionBackend;
use crate::domain::error::ClientError;
use crate::domain::upload_record::{AnalyzeResponse, UploadSummary};
use crate::domain::user::{AuthToken, Credentials};
use crate::infrastructure::config::ClientConfig;

/// HTTP client for the visualizer API.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base(&config.base_url)?;
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidResponse(format!("Bad endpoint {}: {}", path, e)))
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<AuthToken, ClientError> {
        let request = self
            .client
            .post(self.endpoint(path)?)
            .timeout(self.request_timeout)
            .json(credentials);
        send_json(request).await
    }
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError> {
        self.post_credentials("login/", credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthToken, ClientError> {
        self.post_credentials("register/", credentials).await
    }

    async fn upload(&self, token: &str, path: &Path) -> Result<AnalyzeResponse, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Io(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        debug!(file = %file_name, size = bytes.len(), "Uploading file");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let request = self
            .client
            .post(self.endpoint("analyze/")?)
            .header(reqwest::header::AUTHORIZATION, token_header(token))
            .multipart(Form::new().part("file", part));
        send_json(request).await
    }

    async fn history(&self, token: &str) -> Result<Vec<UploadSummary>, ClientError> {
        let request = self
            .client
            .get(self.endpoint("analyze/")?)
            .timeout(self.request_timeout)
            .header(reqwest::header::AUTHORIZATION, token_header(token));
        send_json(request).await
    }
}

fn token_header(token: &str) -> String {
    format!("Token {}", token)
}

/// Joins need a trailing slash, otherwise the last segment is replaced.
fn normalize_base(base: &str) -> Result<Url, ClientError> {
    let trimmed = base.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash)
        .map_err(|e| ClientError::InvalidResponse(format!("Invalid base URL {}: {}", base, e)))
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    if !status.is_success() {
        let message = error_message(&text)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        warn!(status = status.as_u16(), message = %message, "API request failed");
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Pulls a display message out of an error body.
///
/// Order: `error`, then `detail`, then the first field-level message.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "detail"] {
        if let Some(Value::String(message)) = object.get(key) {
            return Some(message.clone());
        }
    }

    object.values().find_map(|value| match value {
        Value::Array(items) => items.iter().find_map(|item| item.as_str().map(str::to_string)),
        Value::String(message) => Some(message.clone()),
        _ => None,
    })
}
