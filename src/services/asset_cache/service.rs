//! Asset cache service with in-flight request tracking

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::pending::{FetchOutcome, PendingLanes, PendingRequest, SharedOutcome};
use crate::config::{AppConfig, AssetsConfig};
use crate::errors::{AssetError, AssetResult};
use crate::models::{
    Asset, AssetBlob, AssetCacheStats, AssetClass, AssetKey, ENTITY_TYPE_EXPLORATION, PendingRequests,
    RequestLane, ServerMessage,
};
use crate::services::asset_urls::AssetUrls;
use crate::services::csrf_token::{CsrfTokenProvider, CsrfTokenService};
use crate::services::transport::{AssetTransport, HttpTransport, UploadForm};
use crate::utils::{parse_xssi_json, strip_xssi_prefix};

/// Fetches, memoizes and uploads assets.
///
/// Cloning is cheap and every clone shares the same cache and pending lists,
/// so one instance is built at startup and handed to all consumers.
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<Inner>,
}

struct Inner {
    urls: AssetUrls,
    transport: Arc<dyn AssetTransport>,
    csrf: Arc<dyn CsrfTokenProvider>,
    state: Mutex<CacheState>,
    next_request_id: AtomicU64,
    counters: Counters,
}

#[derive(Default)]
struct CacheState {
    /// filename -> fetched blob, shared across asset classes
    assets: HashMap<String, AssetBlob>,
    pending: PendingLanes,
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    network_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    failed_requests: AtomicU64,
    cancelled_requests: AtomicU64,
}

enum FetchStart {
    Cached(AssetBlob),
    InFlight(SharedOutcome),
}

impl AssetCache {
    /// Create the cache. Fails outside dev mode when no bucket is configured.
    pub fn new(
        config: &AssetsConfig,
        transport: Arc<dyn AssetTransport>,
        csrf: Arc<dyn CsrfTokenProvider>,
    ) -> AssetResult<Self> {
        let urls = AssetUrls::new(config)?;

        if config.dev_mode {
            info!("Asset cache initialized (dev mode, serving from local handler)");
        } else {
            info!(
                "Asset cache initialized (bucket: {})",
                config.gcs_resource_bucket_name
            );
        }

        Ok(Self {
            inner: Arc::new(Inner {
                urls,
                transport,
                csrf,
                state: Mutex::new(CacheState::default()),
                next_request_id: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        })
    }

    /// Create the cache with an HTTP transport and CSRF service built from config
    pub fn from_config(config: &AppConfig) -> AssetResult<Self> {
        let transport: Arc<dyn AssetTransport> = Arc::new(HttpTransport::from_config(config)?);
        let csrf = Arc::new(CsrfTokenService::new(
            transport.clone(),
            config.assets.csrf_path.clone(),
        ));
        Self::new(&config.assets, transport, csrf)
    }

    /// Fetch an audio or image asset.
    ///
    /// The pending record is registered before this returns, so callers may
    /// inspect `pending_requests` straight away. A concurrent fetch of a
    /// filename already in flight in the same class awaits that request
    /// instead of issuing another. Called outside a Tokio runtime, the
    /// returned future resolves to `AssetError::Runtime`.
    pub fn fetch(
        &self,
        class: AssetClass,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> BoxFuture<'static, AssetResult<Asset>> {
        let key = AssetKey::new(class, entity_type, entity_id, filename);

        match self.begin_fetch(&key) {
            Ok(FetchStart::Cached(blob)) => future::ready(Ok(key.wrap(blob))).boxed(),
            Ok(FetchStart::InFlight(outcome)) => {
                async move { outcome.await.into_asset(&key) }.boxed()
            }
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }

    pub fn load_audio(
        &self,
        exploration_id: &str,
        filename: &str,
    ) -> BoxFuture<'static, AssetResult<Asset>> {
        self.fetch(
            AssetClass::Audio,
            ENTITY_TYPE_EXPLORATION,
            exploration_id,
            filename,
        )
    }

    pub fn load_image(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> BoxFuture<'static, AssetResult<Asset>> {
        self.fetch(AssetClass::Image, entity_type, entity_id, filename)
    }

    fn begin_fetch(&self, key: &AssetKey) -> AssetResult<FetchStart> {
        if !key.class.is_fetchable() {
            return Err(AssetError::UnsupportedClass { class: key.class });
        }
        if key.filename.is_empty() {
            return Err(AssetError::validation("filename must not be empty"));
        }
        let lane = key.class.lane();
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| AssetError::Runtime {
            message: format!("cannot fetch {}: {}", key.filename, e),
        })?;

        let mut state = self.inner.lock_state();

        if let Some(blob) = state.assets.get(&key.filename) {
            self.inner.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Serving {} from cache ({} bytes)", key.filename, blob.data.len());
            return Ok(FetchStart::Cached(blob.clone()));
        }

        if let Some(pending) = state.pending.find(lane, &key.filename) {
            self.inner
                .counters
                .coalesced_requests
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                "Joining in-flight {} request for {}",
                key.class, key.filename
            );
            return Ok(FetchStart::InFlight(pending.outcome.clone()));
        }

        let url = self.inner.urls.download_url(
            key.class,
            &key.entity_type,
            &key.entity_id,
            &key.filename,
        )?;
        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        // The task settles under the same lock, so it cannot observe the
        // lane before the record below is pushed.
        let task = runtime.spawn(Inner::run_request(
            self.inner.clone(),
            lane,
            id,
            key.filename.clone(),
            url,
            cancel.clone(),
        ));
        let outcome = async move {
            task.await
                .unwrap_or_else(|e| FetchOutcome::Failed(format!("request task failed: {}", e)))
        }
        .boxed()
        .shared();

        state.pending.push(
            lane,
            PendingRequest {
                id,
                filename: key.filename.clone(),
                cancel,
                outcome: outcome.clone(),
            },
        );
        self.inner
            .counters
            .network_requests
            .fetch_add(1, Ordering::Relaxed);
        debug!("Requesting {} asset {}", key.class, key.filename);

        Ok(FetchStart::InFlight(outcome))
    }

    /// Upload raw audio bytes for an exploration.
    ///
    /// Resolves with the server's message on success; a rejection carries the
    /// server's JSON error body.
    pub async fn save(
        &self,
        entity_id: &str,
        filename: &str,
        raw_data: impl Into<Bytes>,
    ) -> AssetResult<ServerMessage> {
        if filename.is_empty() {
            return Err(AssetError::validation("filename must not be empty"));
        }
        let url = self.inner.urls.audio_upload_url(entity_id)?;
        let csrf_token = self.inner.csrf.token().await?;

        let form = UploadForm {
            filename: filename.to_string(),
            raw_audio_file: raw_data.into(),
            payload: json!({ "filename": filename }).to_string(),
            csrf_token,
        };

        let response = self.inner.transport.post_multipart(&url, form).await?;
        let body = response.text();

        if response.is_success() {
            info!("Uploaded {} for {}", filename, entity_id);
            return Ok(ServerMessage(strip_xssi_prefix(&body).to_string()));
        }

        let payload = parse_xssi_json::<Value>(&body)
            .unwrap_or_else(|_| Value::String(strip_xssi_prefix(&body).to_string()));
        warn!(
            "Upload of {} for {} rejected with HTTP {}: {}",
            filename, entity_id, response.status, payload
        );
        Err(AssetError::UploadRejected {
            status: response.status,
            payload,
        })
    }

    pub fn is_cached(&self, filename: &str) -> bool {
        self.inner.lock_state().assets.contains_key(filename)
    }

    pub fn is_currently_requested(&self, filename: &str, class: AssetClass) -> bool {
        self.inner
            .lock_state()
            .pending
            .find(class.lane(), filename)
            .is_some()
    }

    /// Cancel every pending request of `class`. Thumbnails share the image list.
    pub fn abort_all(&self, class: AssetClass) {
        let lane = class.lane();
        let drained = self.inner.lock_state().pending.drain(lane);
        if drained.is_empty() {
            return;
        }

        for request in &drained {
            request.cancel.cancel();
        }
        self.inner
            .counters
            .cancelled_requests
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        info!("Aborted {} pending {} downloads", drained.len(), class);
    }

    pub fn abort_all_audio_downloads(&self) {
        self.abort_all(AssetClass::Audio);
    }

    pub fn abort_all_image_downloads(&self) {
        self.abort_all(AssetClass::Image);
    }

    pub fn pending_requests(&self) -> PendingRequests {
        self.inner.lock_state().pending.snapshot()
    }

    pub fn stats(&self) -> AssetCacheStats {
        let (cached_entries, cached_bytes) = {
            let state = self.inner.lock_state();
            let bytes: usize = state.assets.values().map(|blob| blob.data.len()).sum();
            (state.assets.len() as u64, bytes as u64)
        };
        let counters = &self.inner.counters;

        AssetCacheStats {
            cache_hits: counters.cache_hits.load(Ordering::Relaxed),
            network_requests: counters.network_requests.load(Ordering::Relaxed),
            coalesced_requests: counters.coalesced_requests.load(Ordering::Relaxed),
            failed_requests: counters.failed_requests.load(Ordering::Relaxed),
            cancelled_requests: counters.cancelled_requests.load(Ordering::Relaxed),
            cached_entries,
            cached_bytes,
        }
    }

    pub fn urls(&self) -> &AssetUrls {
        &self.inner.urls
    }

    pub fn audio_download_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        self.inner
            .urls
            .audio_download_url(entity_type, entity_id, filename)
    }

    pub fn image_preview_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        self.inner
            .urls
            .image_preview_url(entity_type, entity_id, filename)
    }

    pub fn thumbnail_preview_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        self.inner
            .urls
            .thumbnail_preview_url(entity_type, entity_id, filename)
    }

    pub fn audio_upload_url(&self, exploration_id: &str) -> AssetResult<String> {
        self.inner.urls.audio_upload_url(exploration_id)
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_request(
        self: Arc<Self>,
        lane: RequestLane,
        id: u64,
        filename: String,
        url: String,
        cancel: CancellationToken,
    ) -> FetchOutcome {
        let guard = SettleGuard {
            inner: self.clone(),
            lane,
            id,
            filename,
            settled: false,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            response = self.transport.get(&url) => Some(response),
        };

        let outcome = match response {
            None => FetchOutcome::Cancelled,
            Some(Ok(response)) if response.is_success() => {
                FetchOutcome::Fetched(AssetBlob::new(response.body, response.content_type))
            }
            Some(Ok(response)) => FetchOutcome::Failed(format!("HTTP {}", response.status)),
            Some(Err(e)) => FetchOutcome::Failed(e.to_string()),
        };

        guard.settle(outcome)
    }

    /// Record how a request ended. A request no longer registered was
    /// aborted, and its result is discarded.
    fn settle(&self, lane: RequestLane, id: u64, filename: &str, outcome: FetchOutcome) -> FetchOutcome {
        let mut state = self.lock_state();

        if state.pending.remove(lane, id).is_none() {
            debug!("Discarding result of cancelled request for {}", filename);
            return FetchOutcome::Cancelled;
        }

        match &outcome {
            FetchOutcome::Fetched(blob) => {
                debug!("Cached {} ({} bytes)", filename, blob.data.len());
                state.assets.insert(filename.to_string(), blob.clone());
            }
            FetchOutcome::Failed(reason) => {
                self.counters.failed_requests.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to fetch {}: {}", filename, reason);
            }
            FetchOutcome::Cancelled => {}
        }

        outcome
    }
}

/// Settles a request exactly once. Dropped unsettled, as when the transport
/// panics or the runtime shuts down mid-request, it removes the pending
/// record so the filename can be fetched again.
struct SettleGuard {
    inner: Arc<Inner>,
    lane: RequestLane,
    id: u64,
    filename: String,
    settled: bool,
}

impl SettleGuard {
    fn settle(mut self, outcome: FetchOutcome) -> FetchOutcome {
        self.settled = true;
        self.inner.settle(self.lane, self.id, &self.filename, outcome)
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let removed = self.inner.lock_state().pending.remove(self.lane, self.id);
        if removed.is_some() {
            self.inner
                .counters
                .failed_requests
                .fetch_add(1, Ordering::Relaxed);
            warn!("Request for {} ended without settling", self.filename);
        }
    }
}
