//! Product photography: packshots, shadows, and lifestyle scenes.
//!
//! Each mode uploads the product image with `force_rmbg` set so the
//! server cuts the product out first, plus one mode-specific field. The
//! reply holds a single result URL and is decoded with
//! [`crate::api::decode_reply`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::{ApiRequest, FormPart, RequestError, non_blank, push_api_key};
use crate::source::SourceImage;

/// Packshot background used until the user picks another.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// Lifestyle scene used until the user writes their own.
pub const DEFAULT_SCENE: &str = "A professional studio setting";

/// What to do with the product image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductMode {
    /// Product on a flat background color.
    #[default]
    Packshot,
    /// Product with a generated shadow.
    Shadow,
    /// Product placed in a described scene.
    Lifestyle,
}

impl ProductMode {
    /// All modes in tab order.
    pub const ALL: [Self; 3] = [Self::Packshot, Self::Shadow, Self::Lifestyle];

    /// API path, relative to the configured base URL.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Packshot => "/product/packshot",
            Self::Shadow => "/product/shadow",
            Self::Lifestyle => "/product/lifestyle-text",
        }
    }

    /// Tab label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Packshot => "Packshot",
            Self::Shadow => "Shadows",
            Self::Lifestyle => "Lifestyle",
        }
    }

    /// Short name accepted on the command line.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Packshot => "packshot",
            Self::Shadow => "shadow",
            Self::Lifestyle => "lifestyle",
        }
    }
}

impl fmt::Display for ProductMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packshot" => Ok(Self::Packshot),
            "shadow" | "shadows" => Ok(Self::Shadow),
            "lifestyle" => Ok(Self::Lifestyle),
            _ => Err(format!(
                "unknown product mode {s:?} (expected packshot, shadow or lifestyle)"
            )),
        }
    }
}

/// Kind of shadow the shadow mode adds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowType {
    /// Drop shadow under the product.
    #[default]
    Regular,
    /// Shadow offset below, as if the product hovers.
    Float,
}

impl ShadowType {
    /// All shadow types in picker order.
    pub const ALL: [Self; 2] = [Self::Regular, Self::Float];

    /// Form value.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Float => "float",
        }
    }

    /// Picker label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Regular => "Regular Drop Shadow",
            Self::Float => "Floating Shadow",
        }
    }
}

impl FromStr for ShadowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.value().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown shadow type {s:?} (expected regular or float)"))
    }
}

/// Per-mode settings. Only the field of the chosen mode is sent, but all
/// of them survive switching tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSettings {
    /// Packshot background, `#RGB` or `#RRGGBB`.
    pub background_color: String,
    /// Shadow mode's shadow.
    pub shadow_type: ShadowType,
    /// Lifestyle mode's scene.
    pub scene_description: String,
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_owned(),
            shadow_type: ShadowType::default(),
            scene_description: DEFAULT_SCENE.to_owned(),
        }
    }
}

/// `#RGB` or `#RRGGBB`, case-insensitive.
fn is_hex_color(color: &str) -> bool {
    color.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// A fully assembled product-studio request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRequest {
    mode: ProductMode,
    parts: Vec<FormPart>,
}

impl ProductRequest {
    /// Parts are ordered `file`, the mode's field, `force_rmbg`, then
    /// `api_key` if one is configured.
    ///
    /// # Errors
    ///
    /// - [`RequestError::InvalidColor`] for a packshot background that is
    ///   not a hex color.
    /// - [`RequestError::MissingSceneDescription`] for a lifestyle shot
    ///   with a blank scene.
    pub fn new(
        source: &SourceImage,
        mode: ProductMode,
        settings: &ProductSettings,
        api_key: Option<&str>,
    ) -> Result<Self, RequestError> {
        let field = match mode {
            ProductMode::Packshot => {
                let color = settings.background_color.trim();
                if !is_hex_color(color) {
                    return Err(RequestError::InvalidColor(color.to_owned()));
                }
                FormPart::text("background_color", color.to_ascii_uppercase())
            }
            ProductMode::Shadow => FormPart::text("shadow_type", settings.shadow_type.value()),
            ProductMode::Lifestyle => {
                let scene = non_blank(Some(settings.scene_description.as_str()))
                    .ok_or(RequestError::MissingSceneDescription)?;
                FormPart::text("scene_description", scene)
            }
        };

        let mut parts = vec![
            FormPart::source("file", source),
            field,
            FormPart::text("force_rmbg", "true"),
        ];
        push_api_key(&mut parts, api_key);
        Ok(Self { mode, parts })
    }

    /// Which mode this request is for.
    #[must_use]
    pub const fn mode(&self) -> ProductMode {
        self.mode
    }
}

impl ApiRequest for ProductRequest {
    fn endpoint(&self) -> &'static str {
        self.mode.endpoint()
    }

    fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}
