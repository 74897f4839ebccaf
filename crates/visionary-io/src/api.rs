//! API request submission with `fetch`.

use visionary_mask::{
    ApiConfig, ApiError, ApiRequest, EnhanceRequest, FormValue, GenerateRequest, ResultLocator,
    decode_enhanced, decode_gallery, decode_reply,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::raster::bytes_to_blob;

/// Errors raised by the browser before a response is available.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// A browser API call returned an error (including network failure).
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for SubmitError {
    fn from(value: JsValue) -> Self {
        // Network failures reject with a TypeError whose message is the
        // only useful part.
        let message = value
            .dyn_ref::<js_sys::Error>()
            .map_or_else(|| format!("{value:?}"), |e| String::from(e.message()));
        Self::JsError(message)
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::JsError(message) => Self::Transport(message),
        }
    }
}

/// POST an edit or product request as multipart form data and decode
/// the single result URL.
///
/// A single attempt: no retries, no cancellation.
///
/// # Errors
///
/// Returns [`ApiError::Transport`] if the request does not complete and
/// the [`decode_reply`] errors otherwise.
#[allow(clippy::future_not_send)] // WASM is single-threaded; JsFuture is !Send
pub async fn submit(
    config: &ApiConfig,
    request: &impl ApiRequest,
) -> Result<ResultLocator, ApiError> {
    let (status, body) = post(config, request).await?;
    decode_reply(status, &body)
}

/// POST a generation request and decode every returned image URL.
///
/// # Errors
///
/// Returns [`ApiError::Transport`] if the request does not complete and
/// the [`decode_gallery`] errors otherwise.
#[allow(clippy::future_not_send)]
pub async fn generate(
    config: &ApiConfig,
    request: &GenerateRequest,
) -> Result<Vec<String>, ApiError> {
    let (status, body) = post(config, request).await?;
    decode_gallery(status, &body)
}

/// POST a prompt for enhancement and return the rewritten prompt.
///
/// # Errors
///
/// Returns [`ApiError::Transport`] if the request does not complete and
/// the [`decode_enhanced`] errors otherwise.
#[allow(clippy::future_not_send)]
pub async fn enhance(config: &ApiConfig, request: &EnhanceRequest) -> Result<String, ApiError> {
    let (status, body) = post(config, request).await?;
    decode_enhanced(status, &body)
}

#[allow(clippy::future_not_send)]
async fn post(config: &ApiConfig, request: &impl ApiRequest) -> Result<(u16, Vec<u8>), ApiError> {
    let url = config.endpoint_url(request.endpoint());
    log::debug!("POST {url}");
    let (status, body) = send(&url, request).await?;
    log::debug!("{url} answered HTTP {status} ({} bytes)", body.len());
    Ok((status, body))
}

#[allow(clippy::future_not_send)]
async fn send(url: &str, request: &impl ApiRequest) -> Result<(u16, Vec<u8>), SubmitError> {
    let form = web_sys::FormData::new()?;
    for part in request.parts() {
        match &part.value {
            FormValue::Text(text) => form.append_with_str(part.name, text)?,
            FormValue::File {
                bytes,
                filename,
                mime,
            } => {
                let blob = bytes_to_blob(bytes, mime)?;
                form.append_with_blob_and_filename(part.name, &blob, filename)?;
            }
        }
    }

    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    init.set_body(&form);

    let window =
        web_sys::window().ok_or_else(|| SubmitError::JsError("no global window".into()))?;
    let response: web_sys::Response =
        JsFuture::from(window.fetch_with_str_and_init(url, &init))
            .await?
            .dyn_into()
            .map_err(|e| SubmitError::JsError(format!("fetch did not return a Response: {e:?}")))?;

    let status = response.status();
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok((status, js_sys::Uint8Array::new(&buffer).to_vec()))
}
