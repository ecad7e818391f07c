use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{AssetError, AssetResult};

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where assets are served from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Serve assets through the local dev handler instead of the bucket
    #[serde(default = "default_dev_mode")]
    pub dev_mode: bool,
    /// Storage bucket holding assets; mandatory outside dev mode
    #[serde(default)]
    pub gcs_resource_bucket_name: String,
    #[serde(default = "default_gcs_base_url")]
    pub gcs_base_url: String,
    /// Origin that relative handler URLs are resolved against
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_csrf_path")]
    pub csrf_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    pub user_agent: Option<String>,
}

fn default_dev_mode() -> bool {
    DEFAULT_DEV_MODE
}

fn default_gcs_base_url() -> String {
    DEFAULT_GCS_BASE_URL.to_string()
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_csrf_path() -> String {
    DEFAULT_CSRF_PATH.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dev_mode: default_dev_mode(),
            gcs_resource_bucket_name: String::new(),
            gcs_base_url: default_gcs_base_url(),
            origin: default_origin(),
            csrf_path: default_csrf_path(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            user_agent: None,
        }
    }
}

impl AssetsConfig {
    /// Development configuration serving from `/assetsdevhandler`
    pub fn dev() -> Self {
        Self {
            dev_mode: true,
            ..Self::default()
        }
    }

    /// Production configuration serving from the given bucket
    pub fn production(bucket: impl Into<String>) -> Self {
        Self {
            dev_mode: false,
            gcs_resource_bucket_name: bucket.into(),
            ..Self::default()
        }
    }

    /// Outside dev mode a bucket name is required
    pub fn validate(&self) -> AssetResult<()> {
        if !self.dev_mode && self.gcs_resource_bucket_name.trim().is_empty() {
            return Err(AssetError::configuration(
                "GCS_RESOURCE_BUCKET_NAME is not set in prod.",
            ));
        }
        Ok(())
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> AssetResult<Duration> {
        humantime::parse_duration(&self.request_timeout).map_err(|e| {
            AssetError::configuration(format!(
                "Invalid request_timeout '{}': {}",
                self.request_timeout, e
            ))
        })
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
    }
}

impl AppConfig {
    pub fn load() -> AssetResult<Self> {
        let config_file =
            std::env::var(ENV_CONFIG_FILE).unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> AssetResult<Self> {
        let mut config = if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)
                .map_err(|e| AssetError::configuration(format!("{}: {}", config_file, e)))?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)
                .map_err(|e| AssetError::configuration(e.to_string()))?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup` so tests need not touch
    /// the process environment
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DEV_MODE) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.assets.dev_mode = true,
                "0" | "false" | "no" | "off" => self.assets.dev_mode = false,
                other => warn!("Ignoring invalid {} value '{}'", ENV_DEV_MODE, other),
            }
        }
        if let Some(bucket) = lookup(ENV_BUCKET_NAME) {
            self.assets.gcs_resource_bucket_name = bucket;
        }
        if let Some(origin) = lookup(ENV_ORIGIN) {
            self.assets.origin = origin;
        }
    }
}
