//! Centralized error handling for the asset cache
//!
//! This module provides the error types shared by every layer of the crate,
//! from configuration loading down to the HTTP transport.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: invalid or incomplete startup configuration
//! - **Validation Errors**: bad arguments such as an empty filename
//! - **Fetch Errors**: failed or cancelled asset downloads
//! - **Upload Errors**: server-side rejection of an uploaded asset
//! - **Transport Errors**: connection level HTTP failures
//!
//! # Usage
//!
//! ```rust
//! use asset_cache::errors::{AssetError, AssetResult};
//!
//! fn example_function() -> AssetResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AssetError
pub type AssetResult<T> = Result<T, AssetError>;

/// Convenience type alias for registry lookups
pub type RegistryResult<T> = Result<T, RegistryError>;
