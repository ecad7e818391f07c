use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub mod asset;

pub use asset::{Asset, AssetBlob, AudioFile, ImageFile, ServerMessage};

/// Entity type used for exploration scoped assets
pub const ENTITY_TYPE_EXPLORATION: &str = "exploration";

/// Category of downloadable resource
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetClass {
    Audio,
    Image,
    Thumbnail,
}

impl AssetClass {
    /// Whether assets of this class can be fetched through the cache
    pub fn is_fetchable(self) -> bool {
        matches!(self, Self::Audio | Self::Image)
    }

    /// Pending-request lane tracking this class
    pub fn lane(self) -> RequestLane {
        match self {
            Self::Audio => RequestLane::Audio,
            Self::Image | Self::Thumbnail => RequestLane::Image,
        }
    }
}

/// The two ordered in-flight request lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestLane {
    Audio,
    Image,
}

/// Identifies a single asset. Only `filename` takes part in caching; the
/// remaining fields select the download URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetKey {
    pub entity_type: String,
    pub entity_id: String,
    pub filename: String,
    pub class: AssetClass,
}

impl AssetKey {
    pub fn new(
        class: AssetClass,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            filename: filename.into(),
            class,
        }
    }

    /// Wrap a fetched blob in the typed asset for this key's class
    pub fn wrap(&self, blob: AssetBlob) -> Asset {
        Asset::new(self.class, self.filename.clone(), blob)
    }
}

/// Snapshot of in-flight filenames per lane, in issue order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequests {
    pub audio: Vec<String>,
    pub image: Vec<String>,
}

impl PendingRequests {
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.image.is_empty()
    }
}

/// Counters describing cache behaviour since construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCacheStats {
    pub cache_hits: u64,
    pub network_requests: u64,
    pub coalesced_requests: u64,
    pub failed_requests: u64,
    pub cancelled_requests: u64,
    pub cached_entries: u64,
    pub cached_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::str::FromStr;

    #[test]
    fn test_asset_class_string_forms() {
        assert_eq!(AssetClass::Audio.to_string(), "audio");
        assert_eq!(AssetClass::Thumbnail.as_ref(), "thumbnail");
        assert_eq!(AssetClass::from_str("image").unwrap(), AssetClass::Image);
        assert!(AssetClass::from_str("video").is_err());
    }

    #[test]
    fn test_thumbnail_shares_image_lane() {
        assert_eq!(AssetClass::Thumbnail.lane(), RequestLane::Image);
        assert_eq!(AssetClass::Audio.lane(), RequestLane::Audio);
        assert!(!AssetClass::Thumbnail.is_fetchable());
    }

    #[test]
    fn test_key_wraps_by_class() {
        let key = AssetKey::new(AssetClass::Image, "exploration", "0", "a.png");
        let asset = key.wrap(AssetBlob::new(
            Bytes::from_static(b"png"),
            Some("image/png".to_string()),
        ));
        assert!(matches!(asset, Asset::Image(_)));
        assert_eq!(asset.filename(), "a.png");
        assert_eq!(asset.content_type(), Some("image/png"));
    }
}
