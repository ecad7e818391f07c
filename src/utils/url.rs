//! URL utilities for consistent URL handling
//!
//! This module provides template interpolation for handler and bucket URLs,
//! and resolution of relative handler paths against a configured origin.

use std::collections::HashMap;
use url::Url;

use crate::errors::{AssetError, AssetResult};

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Interpolate `<name>` placeholders in a URL template
    ///
    /// Every placeholder must have a non-empty value in `params`. Values are
    /// percent-encoded so that filenames containing spaces or reserved
    /// characters stay within a single path segment. Parameters that are not
    /// referenced by the template are ignored.
    ///
    /// # Arguments
    ///
    /// * `template` - URL template, e.g. `/createhandler/audioupload/<exploration_id>`
    /// * `params` - Placeholder values keyed by placeholder name
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Fully interpolated URL
    /// * `Err(AssetError::Validation)` - Missing or empty parameter, or an
    ///   unterminated placeholder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use asset_cache::utils::url::UrlUtils;
    ///
    /// let params = HashMap::from([("exploration_id", "expid12345")]);
    /// let url = UrlUtils::interpolate("/createhandler/audioupload/<exploration_id>", &params).unwrap();
    /// assert_eq!(url, "/createhandler/audioupload/expid12345");
    /// ```
    pub fn interpolate(template: &str, params: &HashMap<&str, &str>) -> AssetResult<String> {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('<') {
            result.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('>').ok_or_else(|| {
                AssetError::validation(format!("Invalid URL template: {}", template))
            })?;
            let name = &after[..end];

            match params.get(name) {
                Some(value) if !value.is_empty() => {
                    result.push_str(&urlencoding::encode(value));
                }
                Some(_) => {
                    return Err(AssetError::validation(format!(
                        "Parameter '{}' in URL template {} is empty",
                        name, template
                    )));
                }
                None => {
                    return Err(AssetError::validation(format!(
                        "Expected parameter '{}' for URL template {}",
                        name, template
                    )));
                }
            }
            rest = &after[end + 1..];
        }
        result.push_str(rest);

        Ok(result)
    }

    /// Resolve a possibly relative URL against an origin
    ///
    /// Absolute URLs are returned untouched; relative handler paths such as
    /// `/assetsdevhandler/...` are joined onto `origin`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use asset_cache::utils::url::UrlUtils;
    ///
    /// let url = UrlUtils::resolve("http://localhost:8181", "/csrfhandler").unwrap();
    /// assert_eq!(url.as_str(), "http://localhost:8181/csrfhandler");
    /// ```
    pub fn resolve(origin: &str, url: &str) -> Result<Url, url::ParseError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(origin)?.join(url),
            Err(e) => Err(e),
        }
    }
}
