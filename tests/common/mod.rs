#![allow(dead_code)]

use asset_cache::config::AssetsConfig;
use asset_cache::errors::TransportError;
use asset_cache::services::{
    AssetCache, AssetTransport, StaticCsrfToken, TransportResponse, UploadForm,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub type MockReply = Result<TransportResponse, TransportError>;

enum Route {
    Ready(MockReply),
    Held(oneshot::Receiver<MockReply>),
}

/// In-memory transport. Each URL replays its queued replies in order; held
/// replies resolve when the test sends on the returned channel.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Route>>>,
    requests: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(String, UploadForm)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, url: &str, route: Route) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(route);
    }

    pub fn respond(&self, url: &str, status: u16, body: &'static str) {
        self.push(url, Route::Ready(Ok(TransportResponse::new(status, body))));
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.push(
            url,
            Route::Ready(Err(TransportError::RequestFailed {
                url: url.to_string(),
                message: message.to_string(),
            })),
        );
    }

    /// Queue a reply the test releases later
    pub fn hold(&self, url: &str) -> oneshot::Sender<MockReply> {
        let (tx, rx) = oneshot::channel();
        self.push(url, Route::Held(rx));
        tx
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    pub fn uploads(&self) -> Vec<(String, UploadForm)> {
        self.uploads.lock().unwrap().clone()
    }

    /// Wait until `url` has been requested `count` times
    pub async fn wait_for_requests(&self, url: &str, count: usize) {
        for _ in 0..200 {
            if self.request_count(url) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "expected {} requests to {}, saw {}",
            count,
            url,
            self.request_count(url)
        );
    }

    fn next_route(&self, url: &str) -> Option<Route> {
        self.routes
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
    }

    async fn reply(&self, url: &str) -> MockReply {
        match self.next_route(url) {
            Some(Route::Ready(reply)) => reply,
            Some(Route::Held(rx)) => rx.await.unwrap_or_else(|_| {
                Err(TransportError::RequestFailed {
                    url: url.to_string(),
                    message: "held reply dropped".to_string(),
                })
            }),
            None => Ok(TransportResponse::new(404, "Not Found")),
        }
    }
}

#[async_trait]
impl AssetTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.reply(url).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: UploadForm,
    ) -> Result<TransportResponse, TransportError> {
        self.uploads
            .lock()
            .unwrap()
            .push((url.to_string(), form));
        self.reply(url).await
    }
}

pub const CSRF_TOKEN: &str = "sample-csrf-token";

/// Dev mode cache over `transport` with a fixed CSRF token
pub fn dev_cache(transport: Arc<MockTransport>) -> AssetCache {
    AssetCache::new(
        &AssetsConfig::dev(),
        transport,
        Arc::new(StaticCsrfToken(CSRF_TOKEN.to_string())),
    )
    .unwrap()
}

pub fn audio_url(exploration_id: &str, filename: &str) -> String {
    format!(
        "/assetsdevhandler/exploration/{}/assets/audio/{}",
        exploration_id, filename
    )
}

pub fn image_url(entity_type: &str, entity_id: &str, filename: &str) -> String {
    format!(
        "/assetsdevhandler/{}/{}/assets/image/{}",
        entity_type, entity_id, filename
    )
}
