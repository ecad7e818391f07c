//! Utility modules for the asset cache
//!
//! This module contains reusable helpers that can be used
//! across different parts of the crate.

pub mod url;
pub mod xssi;

pub use self::url::UrlUtils;
pub use xssi::{XSSI_PREFIX, parse_xssi_json, strip_xssi_prefix};
