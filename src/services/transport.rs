use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::errors::{AssetError, AssetResult, TransportError};
use crate::utils::UrlUtils;

/// Status and raw body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
    /// `Content-Type` header, when the server sent one
    pub content_type: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Multipart form sent by an audio upload
#[derive(Debug, Clone)]
pub struct UploadForm {
    /// File name attached to the `raw_audio_file` part
    pub filename: String,
    pub raw_audio_file: Bytes,
    /// JSON encoded `{"filename": ...}`
    pub payload: String,
    pub csrf_token: String,
}

/// HTTP seam used by the cache and the CSRF token service
#[async_trait]
pub trait AssetTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError>;

    async fn post_multipart(
        &self,
        url: &str,
        form: UploadForm,
    ) -> Result<TransportResponse, TransportError>;
}

/// reqwest backed transport resolving relative handler paths against an origin
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    origin: String,
}

impl HttpTransport {
    pub fn new(origin: impl Into<String>, timeout: Duration, user_agent: &str) -> AssetResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AssetError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            origin: origin.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> AssetResult<Self> {
        Self::new(
            config.assets.origin.clone(),
            config.http.request_timeout()?,
            &config.http.user_agent(),
        )
    }

    fn resolve(&self, url: &str) -> Result<url::Url, TransportError> {
        UrlUtils::resolve(&self.origin, url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn read_response(
        url: &str,
        response: reqwest::Response,
    ) -> Result<TransportResponse, TransportError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        debug!("HTTP {} from {} ({} bytes)", status, url, body.len());
        Ok(TransportResponse {
            status,
            body,
            content_type,
        })
    }
}

#[async_trait]
impl AssetTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let resolved = self.resolve(url)?;
        debug!("HTTP GET {}", resolved);

        let response = self.client.get(resolved).send().await.map_err(|e| {
            error!("HTTP GET failed: {} - {}", url, e);
            TransportError::from_reqwest(url, e)
        })?;

        Self::read_response(url, response).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: UploadForm,
    ) -> Result<TransportResponse, TransportError> {
        let resolved = self.resolve(url)?;
        debug!(
            "HTTP POST {} (multipart, {} bytes)",
            resolved,
            form.raw_audio_file.len()
        );

        let file_part = Part::bytes(form.raw_audio_file.to_vec()).file_name(form.filename);
        let multipart = Form::new()
            .part("raw_audio_file", file_part)
            .text("payload", form.payload)
            .text("csrf_token", form.csrf_token);

        let response = self
            .client
            .post(resolved)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| {
                error!("HTTP POST failed: {} - {}", url, e);
                TransportError::from_reqwest(url, e)
            })?;

        Self::read_response(url, response).await
    }
}
