pub mod config;
pub mod errors;
pub mod models;
pub mod registry;
pub mod services;
pub mod utils;

pub use errors::{AssetError, AssetResult};
pub use models::{Asset, AssetClass, PendingRequests};
pub use services::AssetCache;
