//! Configuration default values
//!
//! This module contains all the default values for configuration options,
//! making them easily changeable in one central location.

// Asset defaults
pub const DEFAULT_DEV_MODE: bool = true;
pub const DEFAULT_GCS_BASE_URL: &str = "https://storage.googleapis.com";
pub const DEFAULT_ORIGIN: &str = "http://localhost:8181";
pub const DEFAULT_CSRF_PATH: &str = "/csrfhandler";

// URL templates
pub const DEV_ASSETS_PREFIX: &str = "/assetsdevhandler";
pub const ASSET_PATH_TEMPLATE: &str = "/<entity_type>/<entity_id>/assets/<asset_class>/<filename>";
pub const AUDIO_UPLOAD_URL_TEMPLATE: &str = "/createhandler/audioupload/<exploration_id>";

// HTTP defaults
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";

// Environment overrides
pub const ENV_CONFIG_FILE: &str = "CONFIG_FILE";
pub const ENV_DEV_MODE: &str = "ASSETS_DEV_MODE";
pub const ENV_BUCKET_NAME: &str = "GCS_RESOURCE_BUCKET_NAME";
pub const ENV_ORIGIN: &str = "ASSETS_ORIGIN";
