//! Remote image API: request construction and response decoding.
//!
//! Nothing here performs I/O. The browser and native clients turn any
//! [`ApiRequest`] into a multipart POST with their own HTTP stack and
//! hand the status code and body back to [`decode_reply`] (or the
//! gallery and prompt decoders in [`crate::generate`]).

use serde_json::Value;

use crate::feature::EditFeature;
use crate::source::SourceImage;

/// Filename the mask part is uploaded under.
pub const MASK_FILENAME: &str = "mask.png";

/// Message shown when a failed response carries no usable `detail`.
pub const GENERIC_FAILURE: &str = "Failed to process";

/// Filename offered when the user downloads a result.
pub const RESULT_FILENAME: &str = "visionary-result.png";

/// Value of one multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A plain text field.
    Text(String),
    /// A file field.
    File {
        /// File content.
        bytes: Vec<u8>,
        /// Filename reported to the server.
        filename: String,
        /// Content type of the part.
        mime: String,
    },
}

/// One named multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Field name.
    pub name: &'static str,
    /// Field value.
    pub value: FormValue,
}

impl FormPart {
    pub(crate) fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: FormValue::Text(value.into()),
        }
    }

    /// The uploaded image under its original name and type.
    pub(crate) fn source(name: &'static str, source: &SourceImage) -> Self {
        Self {
            name,
            value: FormValue::File {
                bytes: source.bytes().to_vec(),
                filename: source.filename().to_owned(),
                mime: source.mime().to_owned(),
            },
        }
    }
}

/// Append `api_key` unless it is absent or blank.
pub(crate) fn push_api_key(parts: &mut Vec<FormPart>, api_key: Option<&str>) {
    if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
        parts.push(FormPart::text("api_key", key));
    }
}

/// Trimmed `text`, or `None` if only whitespace is left.
pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// A multipart POST to one of the image API endpoints.
pub trait ApiRequest {
    /// Endpoint path, relative to the API base URL.
    fn endpoint(&self) -> &'static str;

    /// Form fields in submission order.
    fn parts(&self) -> &[FormPart];

    /// Look up a field by name.
    fn part(&self, name: &str) -> Option<&FormValue> {
        self.parts()
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Errors produced while assembling a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The feature needs a prompt and none (or only whitespace) was given.
    #[error("please describe what should fill the masked area")]
    MissingPrompt,

    /// Image generation was asked for with a blank prompt.
    #[error("please describe the image to generate")]
    EmptyPrompt,

    /// A packshot background that is not a `#RRGGBB` color.
    #[error("{0:?} is not a color like #FFFFFF")]
    InvalidColor(String),

    /// A lifestyle shot without a scene.
    #[error("please describe the scene to place the product in")]
    MissingSceneDescription,
}

/// A fully assembled edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    feature: EditFeature,
    parts: Vec<FormPart>,
}

impl EditRequest {
    /// Assemble the form fields for `feature`.
    ///
    /// Parts are ordered `file`, `mask_file`, then `prompt` (fill only),
    /// then `api_key` if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingPrompt`] if the feature requires a
    /// prompt and `prompt` is absent or blank.
    pub fn new(
        feature: EditFeature,
        source: &SourceImage,
        mask_png: Vec<u8>,
        prompt: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Self, RequestError> {
        let mut parts = vec![
            FormPart::source("file", source),
            FormPart {
                name: "mask_file",
                value: FormValue::File {
                    bytes: mask_png,
                    filename: MASK_FILENAME.to_owned(),
                    mime: "image/png".to_owned(),
                },
            },
        ];

        if feature.requires_prompt() {
            let prompt = non_blank(prompt).ok_or(RequestError::MissingPrompt)?;
            parts.push(FormPart::text("prompt", prompt));
        }
        push_api_key(&mut parts, api_key);

        Ok(Self { feature, parts })
    }

    /// Which feature this request is for.
    #[must_use]
    pub const fn feature(&self) -> EditFeature {
        self.feature
    }
}

impl ApiRequest for EditRequest {
    fn endpoint(&self) -> &'static str {
        self.feature.endpoint()
    }

    fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}

/// Where a successful response put the result image URL.
///
/// The service has answered in several shapes over time. Decoding tries
/// them in the order the variants are declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLocator {
    /// `{"result_url": "..."}`
    ResultUrl(String),
    /// `{"result_urls": ["...", ...]}`, first element.
    ResultUrls(String),
    /// `{"urls": ["...", ...]}`, first element.
    Urls(String),
    /// `{"result": "..."}` or `{"result": ["...", ...]}`.
    Result(String),
}

impl ResultLocator {
    /// Find the result URL in a response body.
    ///
    /// Empty strings and empty arrays never match.
    #[must_use]
    pub fn decode(body: &Value) -> Option<Self> {
        let string = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        let first = |key: &str| {
            body.get(key)
                .and_then(Value::as_array)
                .and_then(|a| a.first())
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        string("result_url")
            .map(Self::ResultUrl)
            .or_else(|| first("result_urls").map(Self::ResultUrls))
            .or_else(|| first("urls").map(Self::Urls))
            .or_else(|| string("result").or_else(|| first("result")).map(Self::Result))
    }

    /// The located URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::ResultUrl(url) | Self::ResultUrls(url) | Self::Urls(url) | Self::Result(url) => {
                url
            }
        }
    }

    /// Consume the locator, returning the URL.
    #[must_use]
    pub fn into_url(self) -> String {
        match self {
            Self::ResultUrl(url) | Self::ResultUrls(url) | Self::Urls(url) | Self::Result(url) => {
                url
            }
        }
    }
}

/// Errors from talking to the remote API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (network failure, timeout, CORS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The response's `detail`, or a generic message.
        message: String,
    },

    /// A 2xx response whose body is not JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// A 2xx JSON response with no recognizable result URL.
    #[error("no image URL found in response")]
    NoImageUrl,

    /// A 2xx JSON response without a field the endpoint always returns.
    #[error("response has no {0} field")]
    MissingField(&'static str),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidBody(err.to_string())
    }
}

/// Interpret a response from an edit endpoint.
///
/// # Errors
///
/// - [`ApiError::Status`] for any status outside `200..300`, carrying the
///   body's `detail` field when present.
/// - [`ApiError::InvalidBody`] if a successful body is not JSON.
/// - [`ApiError::NoImageUrl`] if no result URL can be located.
pub fn decode_reply(status: u16, body: &[u8]) -> Result<ResultLocator, ApiError> {
    let value = success_body(status, body)?;
    ResultLocator::decode(&value).ok_or(ApiError::NoImageUrl)
}

/// Check the status and parse a successful body as JSON.
pub(crate) fn success_body(status: u16, body: &[u8]) -> Result<Value, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            message: error_detail(body).unwrap_or_else(|| GENERIC_FAILURE.to_owned()),
        });
    }
    Ok(serde_json::from_slice(body)?)
}

/// `detail` from an error body: strings as-is, other JSON as its text.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::source::Upload;
    use crate::source::tests::png_bytes;

    fn source() -> SourceImage {
        SourceImage::decode(Upload::new(png_bytes(4, 4), "photo.png")).unwrap()
    }

    fn names(request: &EditRequest) -> Vec<&'static str> {
        request.parts().iter().map(|p| p.name).collect()
    }

    #[test]
    fn fill_request_orders_parts() {
        let request = EditRequest::new(
            EditFeature::GenerativeFill,
            &source(),
            vec![1, 2, 3],
            Some("  a red balloon "),
            Some("key"),
        )
        .unwrap();
        assert_eq!(request.endpoint(), "/edit/generative-fill");
        assert_eq!(names(&request), ["file", "mask_file", "prompt", "api_key"]);
        assert_eq!(
            request.part("prompt"),
            Some(&FormValue::Text("a red balloon".into()))
        );
        assert_eq!(
            request.part("mask_file"),
            Some(&FormValue::File {
                bytes: vec![1, 2, 3],
                filename: "mask.png".into(),
                mime: "image/png".into(),
            })
        );
    }

    #[test]
    fn source_part_keeps_original_name_and_type() {
        let request =
            EditRequest::new(EditFeature::ObjectEraser, &source(), Vec::new(), None, None).unwrap();
        assert!(matches!(
            request.part("file"),
            Some(FormValue::File { filename, mime, .. })
                if filename == "photo.png" && mime == "image/png"
        ));
    }

    #[test]
    fn erase_request_has_no_prompt() {
        let request = EditRequest::new(
            EditFeature::ObjectEraser,
            &source(),
            Vec::new(),
            Some("ignored"),
            Some("  "),
        )
        .unwrap();
        assert_eq!(request.endpoint(), "/edit/erase");
        assert_eq!(names(&request), ["file", "mask_file"]);
    }

    #[test]
    fn fill_without_prompt_is_rejected() {
        for prompt in [None, Some(""), Some("   ")] {
            let result =
                EditRequest::new(EditFeature::GenerativeFill, &source(), Vec::new(), prompt, None);
            assert_eq!(result, Err(RequestError::MissingPrompt));
        }
    }

    #[test]
    fn locator_tries_shapes_in_priority_order() {
        let body = json!({
            "result": "d",
            "urls": ["c"],
            "result_urls": ["b"],
            "result_url": "a",
        });
        assert_eq!(
            ResultLocator::decode(&body),
            Some(ResultLocator::ResultUrl("a".into()))
        );

        let body = json!({"result": "d", "urls": ["c"], "result_urls": ["b"]});
        assert_eq!(
            ResultLocator::decode(&body),
            Some(ResultLocator::ResultUrls("b".into()))
        );

        let body = json!({"result": "d", "urls": ["c"]});
        assert_eq!(ResultLocator::decode(&body), Some(ResultLocator::Urls("c".into())));

        let body = json!({"result": "d"});
        assert_eq!(ResultLocator::decode(&body), Some(ResultLocator::Result("d".into())));

        let body = json!({"result": ["e", "f"]});
        assert_eq!(ResultLocator::decode(&body).unwrap().url(), "e");
    }

    #[test]
    fn locator_skips_empty_candidates() {
        let body = json!({"result_url": "", "result_urls": [], "urls": ["x"]});
        assert_eq!(ResultLocator::decode(&body), Some(ResultLocator::Urls("x".into())));
        assert_eq!(ResultLocator::decode(&json!({"result": []})), None);
        assert_eq!(ResultLocator::decode(&json!({"status": "ok"})), None);
    }

    #[test]
    fn reply_success() {
        let located = decode_reply(200, br#"{"result_url":"https://cdn/x.png"}"#).unwrap();
        assert_eq!(located.into_url(), "https://cdn/x.png");
    }

    #[test]
    fn reply_without_url() {
        assert_eq!(decode_reply(200, br#"{"ok":true}"#), Err(ApiError::NoImageUrl));
        assert_eq!(
            ApiError::NoImageUrl.to_string(),
            "no image URL found in response"
        );
    }

    #[test]
    fn reply_with_non_json_body() {
        assert!(matches!(
            decode_reply(200, b"<html>"),
            Err(ApiError::InvalidBody(_))
        ));
    }

    #[test]
    fn error_status_surfaces_detail() {
        let err = decode_reply(401, br#"{"detail":"API Key not found."}"#).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 401,
                message: "API Key not found.".into()
            }
        );
    }

    #[test]
    fn error_status_without_detail_is_generic() {
        for body in [&b""[..], b"oops", br#"{"error":"x"}"#, br#"{"detail":null}"#] {
            let err = decode_reply(500, body).unwrap_err();
            assert_eq!(
                err,
                ApiError::Status {
                    status: 500,
                    message: GENERIC_FAILURE.into()
                }
            );
        }
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let err = decode_reply(422, br#"{"detail":[{"msg":"field required"}]}"#).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 422,
                message: r#"[{"msg":"field required"}]"#.into()
            }
        );
    }
}
