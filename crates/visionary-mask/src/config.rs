//! Editor and remote API configuration.

use serde::{Deserialize, Serialize};

/// Smallest brush width offered by the editor, in mask pixels.
pub const MIN_BRUSH_WIDTH: f32 = 5.0;

/// Largest brush width offered by the editor, in mask pixels.
pub const MAX_BRUSH_WIDTH: f32 = 100.0;

/// Brush width used until the user picks another.
pub const DEFAULT_BRUSH_WIDTH: f32 = 20.0;

/// Default base URL of the remote service (same-origin proxy).
pub const DEFAULT_API_BASE_URL: &str = "/api";

/// Brush settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct BrushConfig {
    /// Stroke width in mask pixels, always within
    /// [`MIN_BRUSH_WIDTH`]`..=`[`MAX_BRUSH_WIDTH`].
    width: f32,
}

impl BrushConfig {
    /// Create a brush config, clamping `width` into the allowed range.
    ///
    /// Non-finite widths fall back to [`DEFAULT_BRUSH_WIDTH`].
    #[must_use]
    pub fn new(width: f32) -> Self {
        Self {
            width: clamp_brush_width(width),
        }
    }

    /// Current stroke width.
    #[must_use]
    pub const fn width(self) -> f32 {
        self.width
    }
}

impl From<f32> for BrushConfig {
    fn from(width: f32) -> Self {
        Self::new(width)
    }
}

impl From<BrushConfig> for f32 {
    fn from(brush: BrushConfig) -> Self {
        brush.width
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BRUSH_WIDTH,
        }
    }
}

/// Clamp a requested brush width into the allowed range.
#[must_use]
pub fn clamp_brush_width(width: f32) -> f32 {
    if width.is_finite() {
        width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH)
    } else {
        DEFAULT_BRUSH_WIDTH
    }
}

/// How strokes appear on the visible display surface.
///
/// The mask surface always receives opaque white; this only controls the
/// user-facing feedback layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Semi-transparent color drawn over the image so it stays visible
    /// beneath the selection.
    Tinted {
        /// Red channel.
        r: u8,
        /// Green channel.
        g: u8,
        /// Blue channel.
        b: u8,
        /// Opacity.
        a: u8,
    },
    /// The display surface shows exactly what the mask receives.
    Mirror,
}

impl Overlay {
    /// `rgba(255, 0, 64, 0.45)`
    pub const DEFAULT_TINT: Self = Self::Tinted {
        r: 255,
        g: 0,
        b: 64,
        a: 115,
    };

    /// Returns `true` if the display differs from the mask.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Tinted { .. })
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::DEFAULT_TINT
    }
}

/// Errors produced while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The base URL was empty after trimming.
    #[error("API base URL is empty")]
    EmptyBaseUrl,
}

/// Where and how to reach the remote image API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL: an absolute URL, a bare host name, or a path prefix
    /// served by a same-origin proxy.
    pub base_url: String,

    /// API key forwarded as the `api_key` form field. When absent the
    /// server falls back to its own configured key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds (native client only; the browser
    /// leaves timeouts to `fetch`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    /// Config pointing at `base_url` with no key and no timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBaseUrl`] if `base_url` is blank.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        Ok(Self {
            base_url: base_url.trim().to_owned(),
            api_key: None,
            timeout_secs: None,
        })
    }

    /// Set the API key, ignoring blank values.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Full URL for an endpoint path.
    ///
    /// - A base that is neither absolute (`http...`) nor a path (`/...`)
    ///   is treated as a bare host and gets `https://` prepended.
    /// - A trailing `/` on the base is dropped.
    /// - The endpoint always gets a leading `/`.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let path = if endpoint.starts_with('/') {
            endpoint.to_owned()
        } else {
            format!("/{endpoint}")
        };

        let mut base = if self.base_url.starts_with("http") || self.base_url.starts_with('/') {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        };
        if base.ends_with('/') {
            base.pop();
        }

        format!("{base}{path}")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn brush_width_is_clamped() {
        assert!((BrushConfig::new(1.0).width() - MIN_BRUSH_WIDTH).abs() < f32::EPSILON);
        assert!((BrushConfig::new(500.0).width() - MAX_BRUSH_WIDTH).abs() < f32::EPSILON);
        assert!((BrushConfig::new(42.0).width() - 42.0).abs() < f32::EPSILON);
        assert!((BrushConfig::new(f32::NAN).width() - DEFAULT_BRUSH_WIDTH).abs() < f32::EPSILON);
    }

    #[test]
    fn deserialized_brush_width_is_clamped() {
        let wide: BrushConfig = serde_json::from_str("500").unwrap();
        assert!((wide.width() - MAX_BRUSH_WIDTH).abs() < f32::EPSILON);
        let thin: BrushConfig = serde_json::from_str("0.5").unwrap();
        assert!((thin.width() - MIN_BRUSH_WIDTH).abs() < f32::EPSILON);
        assert_eq!(serde_json::to_string(&BrushConfig::new(42.0)).unwrap(), "42.0");
    }

    #[test]
    fn brush_default_is_twenty() {
        assert!((BrushConfig::default().width() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn default_overlay_is_translucent_red() {
        let overlay = Overlay::default();
        assert!(overlay.is_visible());
        assert_eq!(
            overlay,
            Overlay::Tinted {
                r: 255,
                g: 0,
                b: 64,
                a: 115
            }
        );
        assert!(!Overlay::Mirror.is_visible());
    }

    #[test]
    fn overlay_serde_round_trip() {
        let json = serde_json::to_string(&Overlay::Mirror).unwrap();
        assert_eq!(json, r#"{"kind":"mirror"}"#);
        let back: Overlay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Overlay::Mirror);
    }

    #[test]
    fn endpoint_url_with_default_proxy_prefix() {
        let config = ApiConfig::default();
        assert_eq!(config.endpoint_url("/edit/erase"), "/api/edit/erase");
        assert_eq!(config.endpoint_url("edit/erase"), "/api/edit/erase");
    }

    #[test]
    fn endpoint_url_with_bare_host_gets_https() {
        let config = ApiConfig::new("backend.example.com/").unwrap();
        assert_eq!(
            config.endpoint_url("/edit/generative-fill"),
            "https://backend.example.com/edit/generative-fill",
        );
    }

    #[test]
    fn endpoint_url_with_absolute_base() {
        let config = ApiConfig::new("http://localhost:8000").unwrap();
        assert_eq!(config.endpoint_url("/edit/erase"), "http://localhost:8000/edit/erase");
    }

    #[test]
    fn blank_base_url_is_rejected() {
        assert_eq!(ApiConfig::new("  "), Err(ConfigError::EmptyBaseUrl));
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let config = ApiConfig::default().with_api_key(Some("   ".into()));
        assert!(config.api_key.is_none());
        let config = ApiConfig::default().with_api_key(Some("secret".into()));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }
}
