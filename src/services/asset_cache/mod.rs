//! Content-addressable asset cache
//!
//! Assets are fetched by entity type, entity id and filename, memoized by
//! filename for the lifetime of the process and never evicted:
//!
//! - at most one request in flight per filename and asset class
//! - concurrent fetches of the same asset share one request
//! - pending requests can be cancelled in bulk per asset class

mod pending;
pub mod service;

pub use service::AssetCache;
