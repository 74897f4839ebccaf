//! Text-to-image generation and prompt enhancement.
//!
//! Neither endpoint takes an image. Generation may answer with several
//! URLs, so its reply is decoded into a gallery instead of a single
//! [`ResultLocator`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{
    ApiError, ApiRequest, FormPart, RequestError, ResultLocator, non_blank, push_api_key,
    success_body,
};

/// Endpoint that turns a prompt into images.
pub const GENERATE_ENDPOINT: &str = "/generate-image";

/// Endpoint that rewrites a prompt into a more detailed one.
pub const ENHANCE_ENDPOINT: &str = "/enhance-prompt";

/// Most images one generation request may ask for.
pub const MAX_RESULTS: u8 = 4;

/// Shape of the generated images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "3:4")]
    Portrait,
}

impl AspectRatio {
    /// All ratios in picker order.
    pub const ALL: [Self; 5] = [
        Self::Square,
        Self::Widescreen,
        Self::Vertical,
        Self::Landscape,
        Self::Portrait,
    ];

    /// Form value, also used as the button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Widescreen => "16:9",
            Self::Vertical => "9:16",
            Self::Landscape => "4:3",
            Self::Portrait => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| format!("unknown aspect ratio {s:?} (expected e.g. 16:9)"))
    }
}

/// Rendering style forwarded to the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageStyle {
    #[default]
    Realistic,
    Artistic,
    Cartoon,
    Sketch,
    Watercolor,
    #[serde(rename = "Oil Painting")]
    OilPainting,
    #[serde(rename = "Digital Art")]
    DigitalArt,
}

impl ImageStyle {
    /// All styles in picker order.
    pub const ALL: [Self; 7] = [
        Self::Realistic,
        Self::Artistic,
        Self::Cartoon,
        Self::Sketch,
        Self::Watercolor,
        Self::OilPainting,
        Self::DigitalArt,
    ];

    /// Form value, also shown in the picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Realistic => "Realistic",
            Self::Artistic => "Artistic",
            Self::Cartoon => "Cartoon",
            Self::Sketch => "Sketch",
            Self::Watercolor => "Watercolor",
            Self::OilPainting => "Oil Painting",
            Self::DigitalArt => "Digital Art",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImageStyle {
    type Err = String;

    /// Case-insensitive; `-` and `_` stand in for spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown style {s:?}"))
    }
}

/// Knobs of one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSettings {
    count: u8,
    /// Shape of every image.
    pub aspect_ratio: AspectRatio,
    /// Rendering style.
    pub style: ImageStyle,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            count: 1,
            aspect_ratio: AspectRatio::default(),
            style: ImageStyle::default(),
        }
    }
}

impl GenerateSettings {
    /// Set how many images to ask for, clamped to `1..=MAX_RESULTS`.
    ///
    /// Returns the count actually applied.
    pub fn set_count(&mut self, count: u8) -> u8 {
        self.count = count.clamp(1, MAX_RESULTS);
        self.count
    }

    /// How many images will be asked for.
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }
}

/// A request for new images from a text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    parts: Vec<FormPart>,
}

impl GenerateRequest {
    /// Parts are ordered `prompt`, `num_results`, `aspect_ratio`, `style`,
    /// then `api_key` if one is configured.
    ///
    /// # Errors
    ///
    /// [`RequestError::EmptyPrompt`] if `prompt` is blank.
    pub fn new(
        prompt: &str,
        settings: &GenerateSettings,
        api_key: Option<&str>,
    ) -> Result<Self, RequestError> {
        let prompt = non_blank(Some(prompt)).ok_or(RequestError::EmptyPrompt)?;
        let mut parts = vec![
            FormPart::text("prompt", prompt),
            FormPart::text("num_results", settings.count.to_string()),
            FormPart::text("aspect_ratio", settings.aspect_ratio.label()),
            FormPart::text("style", settings.style.label()),
        ];
        push_api_key(&mut parts, api_key);
        Ok(Self { parts })
    }
}

impl ApiRequest for GenerateRequest {
    fn endpoint(&self) -> &'static str {
        GENERATE_ENDPOINT
    }

    fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}

/// A request to expand a short prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceRequest {
    parts: Vec<FormPart>,
}

impl EnhanceRequest {
    /// # Errors
    ///
    /// [`RequestError::EmptyPrompt`] if `prompt` is blank.
    pub fn new(prompt: &str, api_key: Option<&str>) -> Result<Self, RequestError> {
        let prompt = non_blank(Some(prompt)).ok_or(RequestError::EmptyPrompt)?;
        let mut parts = vec![FormPart::text("prompt", prompt)];
        push_api_key(&mut parts, api_key);
        Ok(Self { parts })
    }
}

impl ApiRequest for EnhanceRequest {
    fn endpoint(&self) -> &'static str {
        ENHANCE_ENDPOINT
    }

    fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}

/// Interpret a reply from the generation endpoint.
///
/// Every URL is kept: `result_url`, else all of `result_urls`, else each
/// entry of a `result` array (strings, or objects carrying `urls`).
/// Replies in any other shape [`ResultLocator`] understands yield a
/// single image.
///
/// # Errors
///
/// The same as [`crate::api::decode_reply`].
pub fn decode_gallery(status: u16, body: &[u8]) -> Result<Vec<String>, ApiError> {
    let value = success_body(status, body)?;
    let urls = gallery_urls(&value);
    if !urls.is_empty() {
        return Ok(urls);
    }
    ResultLocator::decode(&value)
        .map(|located| vec![located.into_url()])
        .ok_or(ApiError::NoImageUrl)
}

fn gallery_urls(body: &Value) -> Vec<String> {
    fn strings(values: &[Value]) -> impl Iterator<Item = String> + '_ {
        values
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }

    if let Some(url) = body
        .get("result_url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return vec![url.to_owned()];
    }
    if let Some(urls) = body.get("result_urls").and_then(Value::as_array) {
        return strings(urls).collect();
    }
    let Some(items) = body.get("result").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut urls = Vec::new();
    for item in items {
        match item {
            Value::String(url) if !url.is_empty() => urls.push(url.clone()),
            Value::Object(_) => {
                if let Some(nested) = item.get("urls").and_then(Value::as_array) {
                    urls.extend(strings(nested));
                }
            }
            _ => {}
        }
    }
    urls
}

/// Interpret a reply from the enhancement endpoint.
///
/// # Errors
///
/// [`ApiError::MissingField`] if a successful reply has no non-empty
/// `enhanced_prompt`; otherwise the same as [`crate::api::decode_reply`].
pub fn decode_enhanced(status: u16, body: &[u8]) -> Result<String, ApiError> {
    success_body(status, body)?
        .get("enhanced_prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or(ApiError::MissingField("enhanced_prompt"))
}
