//! Anti-JSON-hijacking prefix handling for handler responses

use serde::de::DeserializeOwned;

use crate::errors::AssetResult;

/// Prefix prepended by the server to JSON response bodies
pub const XSSI_PREFIX: &str = ")]}'\n";

/// Remove the prefix if present
pub fn strip_xssi_prefix(body: &str) -> &str {
    body.strip_prefix(XSSI_PREFIX).unwrap_or(body)
}

/// Strip the prefix and parse the remainder as JSON
pub fn parse_xssi_json<T: DeserializeOwned>(body: &str) -> AssetResult<T> {
    Ok(serde_json::from_str(strip_xssi_prefix(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_prefix_is_five_chars() {
        assert_eq!(XSSI_PREFIX.len(), 5);
    }

    #[test]
    fn test_strip_when_present_and_absent() {
        assert_eq!(strip_xssi_prefix(")]}'\nhello"), "hello");
        assert_eq!(strip_xssi_prefix("hello"), "hello");
        assert_eq!(strip_xssi_prefix(")]}'"), ")]}'");
    }

    #[test]
    fn test_parse_error_body() {
        let parsed: Value =
            parse_xssi_json(")]}'\n{ \"message\": \"Error on saving audio\" }").unwrap();
        assert_eq!(parsed, json!({ "message": "Error on saving audio" }));
        assert!(parse_xssi_json::<Value>(")]}'\nnot json").is_err());
    }
}
