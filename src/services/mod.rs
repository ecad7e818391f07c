//! Services layer
//!
//! The asset cache and the collaborators it is built from.

pub mod asset_cache;
pub mod asset_urls;
pub mod csrf_token;
pub mod transport;

pub use asset_cache::AssetCache;
pub use asset_urls::AssetUrls;
pub use csrf_token::{CsrfTokenProvider, CsrfTokenService, StaticCsrfToken};
pub use transport::{AssetTransport, HttpTransport, TransportResponse, UploadForm};
