//! CSRF token retrieval for state-changing requests

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::transport::AssetTransport;
use crate::errors::{AssetError, AssetResult};
use crate::utils::parse_xssi_json;

#[async_trait]
pub trait CsrfTokenProvider: Send + Sync {
    async fn token(&self) -> AssetResult<String>;
}

#[derive(Debug, Deserialize)]
struct CsrfHandlerResponse {
    token: String,
}

/// Fetches the token from the CSRF handler once and memoizes it.
///
/// A failed fetch is not memoized; the next call tries again.
pub struct CsrfTokenService {
    transport: Arc<dyn AssetTransport>,
    handler_url: String,
    token: OnceCell<String>,
}

impl CsrfTokenService {
    pub fn new(transport: Arc<dyn AssetTransport>, handler_url: impl Into<String>) -> Self {
        Self {
            transport,
            handler_url: handler_url.into(),
            token: OnceCell::new(),
        }
    }

    async fn fetch_token(&self) -> AssetResult<String> {
        debug!("Requesting CSRF token from {}", self.handler_url);
        let response = self.transport.get(&self.handler_url).await?;
        if !response.is_success() {
            warn!(
                "CSRF handler {} returned HTTP {}",
                self.handler_url, response.status
            );
            return Err(AssetError::csrf(format!(
                "CSRF handler returned HTTP {}",
                response.status
            )));
        }

        let parsed: CsrfHandlerResponse = parse_xssi_json(&response.text())
            .map_err(|e| AssetError::csrf(format!("Malformed CSRF handler response: {}", e)))?;
        if parsed.token.is_empty() {
            return Err(AssetError::csrf("CSRF handler returned an empty token"));
        }
        Ok(parsed.token)
    }
}

#[async_trait]
impl CsrfTokenProvider for CsrfTokenService {
    async fn token(&self) -> AssetResult<String> {
        self.token
            .get_or_try_init(|| self.fetch_token())
            .await
            .cloned()
    }
}

/// Provider returning a fixed token
#[derive(Debug, Clone)]
pub struct StaticCsrfToken(pub String);

#[async_trait]
impl CsrfTokenProvider for StaticCsrfToken {
    async fn token(&self) -> AssetResult<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::services::transport::{TransportResponse, UploadForm};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued responses for GET and counts calls
    struct ScriptedTransport {
        responses: Mutex<VecDeque<TransportResponse>>,
        calls: Mutex<usize>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<TransportResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AssetTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::RequestFailed {
                    url: url.to_string(),
                    message: "no scripted response".to_string(),
                })
        }

        async fn post_multipart(
            &self,
            url: &str,
            _form: UploadForm,
        ) -> Result<TransportResponse, TransportError> {
            Err(TransportError::RequestFailed {
                url: url.to_string(),
                message: "unexpected POST".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_token_is_fetched_once() {
        let transport = ScriptedTransport::new(vec![TransportResponse::new(
            200,
            ")]}'\n{\"token\": \"sample-csrf-token\"}",
        )]);
        let service = CsrfTokenService::new(transport.clone(), "/csrfhandler");

        assert_eq!(service.token().await.unwrap(), "sample-csrf-token");
        assert_eq!(service.token().await.unwrap(), "sample-csrf-token");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let transport = ScriptedTransport::new(vec![
            TransportResponse::new(500, "Internal Server Error"),
            TransportResponse::new(200, ")]}'\n{\"token\": \"second\"}"),
        ]);
        let service = CsrfTokenService::new(transport.clone(), "/csrfhandler");

        assert!(matches!(service.token().await, Err(AssetError::Csrf { .. })));
        assert_eq!(service.token().await.unwrap(), "second");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let transport = ScriptedTransport::new(vec![TransportResponse::new(200, "<html>")]);
        let service = CsrfTokenService::new(transport, "/csrfhandler");
        assert!(matches!(service.token().await, Err(AssetError::Csrf { .. })));
    }

    #[tokio::test]
    async fn test_static_token() {
        assert_eq!(StaticCsrfToken("abc".to_string()).token().await.unwrap(), "abc");
    }
}
