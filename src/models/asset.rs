//! Typed wrappers over fetched asset bytes

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::AssetClass;
use crate::errors::AssetResult;

/// Fetched bytes together with the MIME type the server reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBlob {
    pub data: Bytes,
    pub content_type: Option<String>,
}

impl AssetBlob {
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }
}

/// Fetched audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub filename: String,
    pub data: Bytes,
    /// `Content-Type` of the download, e.g. `audio/mpeg`
    pub content_type: Option<String>,
}

/// Fetched image or thumbnail file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub data: Bytes,
    pub content_type: Option<String>,
}

impl AudioFile {
    pub fn new(filename: impl Into<String>, blob: AssetBlob) -> Self {
        Self {
            filename: filename.into(),
            data: blob.data,
            content_type: blob.content_type,
        }
    }
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, blob: AssetBlob) -> Self {
        Self {
            filename: filename.into(),
            data: blob.data,
            content_type: blob.content_type,
        }
    }
}

/// Asset resolved by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Audio(AudioFile),
    Image(ImageFile),
}

impl Asset {
    /// Build the wrapper matching `class`; thumbnails are images
    pub fn new(class: AssetClass, filename: impl Into<String>, blob: AssetBlob) -> Self {
        match class {
            AssetClass::Audio => Self::Audio(AudioFile::new(filename, blob)),
            AssetClass::Image | AssetClass::Thumbnail => Self::Image(ImageFile::new(filename, blob)),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Audio(file) => &file.filename,
            Self::Image(file) => &file.filename,
        }
    }

    pub fn data(&self) -> &Bytes {
        match self {
            Self::Audio(file) => &file.data,
            Self::Image(file) => &file.data,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Audio(file) => file.content_type.as_deref(),
            Self::Image(file) => file.content_type.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

/// Plain-text success message returned by an upload, prefix already stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage(pub String);

impl ServerMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the message body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> AssetResult<T> {
        Ok(serde_json::from_str(&self.0)?)
    }
}

impl std::fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
