use log::LevelFilter;
use serde::Deserialize;
use web_sys::Document;

use crate::error::Result;

/// Tuning shipped with the theme. Parsed once at boot.
const BUNDLED_TOML: &str = include_str!("../theme.toml");

/// Id of the optional inline JSON block a page uses to override tuning.
pub const PAGE_SETTINGS_ID: &str = "theme-settings";

// ── Types ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub log_level: String,
    pub header: HeaderConfig,
    pub back_to_top: BackToTopConfig,
    pub toc: TocConfig,
    pub slider: SliderConfig,
    pub share: ShareConfig,
    pub anchors: AnchorConfig,
    pub theme: ThemeStoreConfig,
    pub lightbox: LightboxConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Vertical offset past which the header is marked `scrolled`.
    pub scrolled_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackToTopConfig {
    pub visible_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Distance from the viewport top a heading must reach to become active.
    pub active_offset: f64,
    pub id_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    pub autoplay_ms: u32,
    pub swipe_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub reset_ms: u32,
    pub copied_label: String,
    pub idle_label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub header_offset: f64,
    pub portal_route: String,
    pub portal_marker: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeStoreConfig {
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    pub default_width: u32,
    pub default_height: u32,
    pub background_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub custom_selector: Option<String>,
    pub ignore: Option<String>,
    pub extra_providers: Vec<String>,
}

// ── Defaults ──────────────────────────────────────────

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            log_level: "warn".into(),
            header: HeaderConfig::default(),
            back_to_top: BackToTopConfig::default(),
            toc: TocConfig::default(),
            slider: SliderConfig::default(),
            share: ShareConfig::default(),
            anchors: AnchorConfig::default(),
            theme: ThemeStoreConfig::default(),
            lightbox: LightboxConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig { scrolled_offset: 100.0 }
    }
}

impl Default for BackToTopConfig {
    fn default() -> Self {
        BackToTopConfig { visible_offset: 500.0 }
    }
}

impl Default for TocConfig {
    fn default() -> Self {
        TocConfig {
            active_offset: 150.0,
            id_prefix: "heading-".into(),
        }
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        SliderConfig {
            autoplay_ms: 5000,
            swipe_threshold: 50.0,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        ShareConfig {
            reset_ms: 2000,
            copied_label: "Copied!".into(),
            idle_label: "Copy Link".into(),
        }
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        AnchorConfig {
            header_offset: 100.0,
            portal_route: "#/portal".into(),
            portal_marker: "portal".into(),
        }
    }
}

impl Default for ThemeStoreConfig {
    fn default() -> Self {
        ThemeStoreConfig {
            storage_key: "theme".into(),
        }
    }
}

impl Default for LightboxConfig {
    fn default() -> Self {
        LightboxConfig {
            default_width: 1200,
            default_height: 800,
            background_opacity: 0.9,
        }
    }
}

// ── Loading ───────────────────────────────────────────

impl ThemeConfig {
    pub fn from_toml(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }

    pub fn from_json(src: &str) -> Result<Self> {
        Ok(serde_json::from_str(src)?)
    }

    /// Defaults bundled with the theme, or the compiled defaults if the
    /// bundled file does not parse.
    pub fn bundled() -> Self {
        match Self::from_toml(BUNDLED_TOML) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[config] bundled theme.toml rejected, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Resolve the effective configuration for a page: the page's inline
    /// settings block if present and valid, otherwise the bundled defaults.
    pub fn for_page(document: &Document) -> Self {
        let Some(block) = document.get_element_by_id(PAGE_SETTINGS_ID) else {
            return Self::bundled();
        };
        let raw = block.text_content().unwrap_or_default();
        if raw.trim().is_empty() {
            return Self::bundled();
        }
        match Self::from_json(&raw) {
            Ok(config) => {
                log::debug!("[config] page settings applied");
                config
            }
            Err(e) => {
                log::warn!("[config] ignoring #{}: {}", PAGE_SETTINGS_ID, e);
                Self::bundled()
            }
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_matches_defaults() {
        let parsed = ThemeConfig::from_toml(BUNDLED_TOML).unwrap();
        assert_eq!(parsed, ThemeConfig::default());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config =
            ThemeConfig::from_json(r#"{"slider":{"autoplay_ms":8000},"log_level":"debug"}"#)
                .unwrap();
        assert_eq!(config.slider.autoplay_ms, 8000);
        assert_eq!(config.slider.swipe_threshold, 50.0);
        assert_eq!(config.share.reset_ms, 2000);
        assert_eq!(config.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_media_overrides() {
        let config = ThemeConfig::from_json(
            r#"{"media":{"custom_selector":"iframe[src*='dailymotion']","extra_providers":["dailymotion\\.com"]}}"#,
        )
        .unwrap();
        assert_eq!(
            config.media.custom_selector.as_deref(),
            Some("iframe[src*='dailymotion']")
        );
        assert_eq!(config.media.extra_providers, vec!["dailymotion\\.com".to_string()]);
        assert!(config.media.ignore.is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ThemeConfig::from_json("{slider:").is_err());
    }

    #[test]
    fn test_unknown_level_falls_back_to_warn() {
        let config = ThemeConfig {
            log_level: "chatty".into(),
            ..ThemeConfig::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Warn);
    }
}
