//! In-flight request bookkeeping

use futures::future::{BoxFuture, Shared};
use tokio_util::sync::CancellationToken;

use crate::errors::AssetError;
use crate::models::{Asset, AssetBlob, AssetKey, PendingRequests, RequestLane};

/// How a network request settled. Cloned to every coalesced waiter.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(AssetBlob),
    Failed(String),
    Cancelled,
}

impl FetchOutcome {
    pub fn into_asset(self, key: &AssetKey) -> Result<Asset, AssetError> {
        match self {
            Self::Fetched(blob) => Ok(key.wrap(blob)),
            Self::Failed(reason) => Err(AssetError::fetch_failed(&key.filename, reason)),
            Self::Cancelled => Err(AssetError::Cancelled {
                filename: key.filename.clone(),
            }),
        }
    }
}

pub type SharedOutcome = Shared<BoxFuture<'static, FetchOutcome>>;

pub struct PendingRequest {
    /// Unique per issued request, so a late completion never removes a newer
    /// request for the same filename
    pub id: u64,
    pub filename: String,
    pub cancel: CancellationToken,
    pub outcome: SharedOutcome,
}

/// Audio and image request lists, each in issue order
#[derive(Default)]
pub struct PendingLanes {
    audio: Vec<PendingRequest>,
    image: Vec<PendingRequest>,
}

impl PendingLanes {
    fn lane(&self, lane: RequestLane) -> &Vec<PendingRequest> {
        match lane {
            RequestLane::Audio => &self.audio,
            RequestLane::Image => &self.image,
        }
    }

    fn lane_mut(&mut self, lane: RequestLane) -> &mut Vec<PendingRequest> {
        match lane {
            RequestLane::Audio => &mut self.audio,
            RequestLane::Image => &mut self.image,
        }
    }

    pub fn find(&self, lane: RequestLane, filename: &str) -> Option<&PendingRequest> {
        self.lane(lane).iter().find(|r| r.filename == filename)
    }

    pub fn push(&mut self, lane: RequestLane, request: PendingRequest) {
        debug_assert!(self.find(lane, &request.filename).is_none());
        self.lane_mut(lane).push(request);
    }

    /// Remove the request with `id`, if it is still registered
    pub fn remove(&mut self, lane: RequestLane, id: u64) -> Option<PendingRequest> {
        let requests = self.lane_mut(lane);
        let index = requests.iter().position(|r| r.id == id)?;
        Some(requests.remove(index))
    }

    pub fn drain(&mut self, lane: RequestLane) -> Vec<PendingRequest> {
        std::mem::take(self.lane_mut(lane))
    }

    pub fn snapshot(&self) -> PendingRequests {
        PendingRequests {
            audio: self.audio.iter().map(|r| r.filename.clone()).collect(),
            image: self.image.iter().map(|r| r.filename.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn request(id: u64, filename: &str) -> PendingRequest {
        PendingRequest {
            id,
            filename: filename.to_string(),
            cancel: CancellationToken::new(),
            outcome: futures::future::ready(FetchOutcome::Cancelled)
                .boxed()
                .shared(),
        }
    }

    #[test]
    fn test_remove_matches_id_not_filename() {
        let mut lanes = PendingLanes::default();
        lanes.push(RequestLane::Audio, request(1, "a.mp3"));
        lanes.push(RequestLane::Audio, request(2, "b.mp3"));

        assert!(lanes.remove(RequestLane::Audio, 7).is_none());
        assert_eq!(lanes.remove(RequestLane::Audio, 1).map(|r| r.id), Some(1));
        assert!(lanes.remove(RequestLane::Audio, 1).is_none());
        assert_eq!(lanes.snapshot().audio, vec!["b.mp3".to_string()]);
    }

    #[test]
    fn test_drain_leaves_other_lane() {
        let mut lanes = PendingLanes::default();
        lanes.push(RequestLane::Audio, request(1, "a.mp3"));
        lanes.push(RequestLane::Image, request(2, "a.png"));

        let drained = lanes.drain(RequestLane::Audio);
        assert_eq!(drained.len(), 1);
        let snapshot = lanes.snapshot();
        assert!(snapshot.audio.is_empty());
        assert_eq!(snapshot.image, vec!["a.png".to_string()]);
        assert!(lanes.drain(RequestLane::Audio).is_empty());
    }

    #[test]
    fn test_outcome_mapping() {
        let key = AssetKey::new(crate::models::AssetClass::Audio, "exploration", "0", "myfile.mp3");
        let err = FetchOutcome::Failed("HTTP 500".to_string())
            .into_asset(&key)
            .unwrap_err();
        assert_eq!(err.filename(), Some("myfile.mp3"));
        assert!(FetchOutcome::Cancelled.into_asset(&key).unwrap_err().is_cancelled());
    }
}
