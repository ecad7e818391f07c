//! Download, preview and upload URL builders
//!
//! All builders are pure: they only interpolate templates chosen once from
//! the assets configuration.

use std::collections::HashMap;

use crate::config::AssetsConfig;
use crate::config::defaults::{ASSET_PATH_TEMPLATE, AUDIO_UPLOAD_URL_TEMPLATE, DEV_ASSETS_PREFIX};
use crate::errors::AssetResult;
use crate::models::AssetClass;
use crate::utils::UrlUtils;

#[derive(Debug, Clone)]
pub struct AssetUrls {
    download_template: String,
}

impl AssetUrls {
    /// Build the URL templates for the configured mode.
    ///
    /// Dev mode serves from `/assetsdevhandler`; otherwise assets come from
    /// `<gcs_base_url>/<bucket>`.
    pub fn new(config: &AssetsConfig) -> AssetResult<Self> {
        config.validate()?;

        let prefix = if config.dev_mode {
            DEV_ASSETS_PREFIX.to_string()
        } else {
            format!(
                "{}/{}",
                config.gcs_base_url.trim_end_matches('/'),
                config.gcs_resource_bucket_name.trim()
            )
        };

        Ok(Self {
            download_template: format!("{}{}", prefix, ASSET_PATH_TEMPLATE),
        })
    }

    pub fn download_url(
        &self,
        class: AssetClass,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        let params = HashMap::from([
            ("entity_type", entity_type),
            ("entity_id", entity_id),
            ("asset_class", class.as_ref()),
            ("filename", filename),
        ]);
        UrlUtils::interpolate(&self.download_template, &params)
    }

    pub fn audio_download_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        self.download_url(AssetClass::Audio, entity_type, entity_id, filename)
    }

    pub fn image_preview_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        self.download_url(AssetClass::Image, entity_type, entity_id, filename)
    }

    pub fn thumbnail_preview_url(
        &self,
        entity_type: &str,
        entity_id: &str,
        filename: &str,
    ) -> AssetResult<String> {
        self.download_url(AssetClass::Thumbnail, entity_type, entity_id, filename)
    }

    pub fn audio_upload_url(&self, exploration_id: &str) -> AssetResult<String> {
        let params = HashMap::from([("exploration_id", exploration_id)]);
        UrlUtils::interpolate(AUDIO_UPLOAD_URL_TEMPLATE, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AssetClass::Audio, "a.mp3", "/assetsdevhandler/exploration/expid12345/assets/audio/a.mp3")]
    #[case(AssetClass::Image, "a.png", "/assetsdevhandler/exploration/expid12345/assets/image/a.png")]
    #[case(
        AssetClass::Thumbnail,
        "thumbnail.png",
        "/assetsdevhandler/exploration/expid12345/assets/thumbnail/thumbnail.png"
    )]
    fn test_dev_mode_urls(#[case] class: AssetClass, #[case] filename: &str, #[case] expected: &str) {
        let urls = AssetUrls::new(&AssetsConfig::dev()).unwrap();
        assert_eq!(
            urls.download_url(class, "exploration", "expid12345", filename)
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_production_urls() {
        let urls = AssetUrls::new(&AssetsConfig::production("my-bucket")).unwrap();
        assert_eq!(
            urls.audio_download_url("exploration", "expid12345", "a.mp3")
                .unwrap(),
            "https://storage.googleapis.com/my-bucket/exploration/expid12345/assets/audio/a.mp3"
        );
        assert_eq!(
            urls.thumbnail_preview_url("topic", "t1", "thumb.svg").unwrap(),
            "https://storage.googleapis.com/my-bucket/topic/t1/assets/thumbnail/thumb.svg"
        );
    }

    #[test]
    fn test_custom_bucket_base() {
        let config = AssetsConfig {
            gcs_base_url: "https://cdn.example.com/".to_string(),
            ..AssetsConfig::production("assets")
        };
        let urls = AssetUrls::new(&config).unwrap();
        assert_eq!(
            urls.image_preview_url("skill", "s1", "x.png").unwrap(),
            "https://cdn.example.com/assets/skill/s1/assets/image/x.png"
        );
    }

    #[test]
    fn test_upload_url_is_mode_independent() {
        let dev = AssetUrls::new(&AssetsConfig::dev()).unwrap();
        let prod = AssetUrls::new(&AssetsConfig::production("b")).unwrap();
        assert_eq!(dev.audio_upload_url("0").unwrap(), "/createhandler/audioupload/0");
        assert_eq!(prod.audio_upload_url("0").unwrap(), "/createhandler/audioupload/0");
    }

    #[test]
    fn test_missing_bucket_fails() {
        assert!(AssetUrls::new(&AssetsConfig::production("")).is_err());
    }

    #[test]
    fn test_empty_filename_rejected() {
        let urls = AssetUrls::new(&AssetsConfig::dev()).unwrap();
        assert!(urls.audio_download_url("exploration", "0", "").is_err());
    }
}
