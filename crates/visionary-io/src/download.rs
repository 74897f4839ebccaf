//! File download via Blob URLs.
//!
//! Dioxus has no built-in file download API.  This module triggers
//! downloads by creating a `Blob`, generating an object URL, and
//! programmatically clicking a temporary `<a>` element.
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::raster::{ObjectUrl, RasterError};

/// Content type assumed when a fetched result carries none.
const DEFAULT_RESULT_MIME: &str = "image/png";

/// Errors that can occur when triggering a file download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),

    /// Fetching the remote file returned a non-2xx status.
    #[error("download failed with HTTP {0}")]
    Status(u16),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

impl From<RasterError> for DownloadError {
    fn from(err: RasterError) -> Self {
        Self::JsError(err.to_string())
    }
}

/// Trigger a download of `bytes` as `filename`.
///
/// The object URL lives only for the duration of the click.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if any browser API call fails
/// (e.g., `Blob` creation, `URL.createObjectURL`, element creation).
pub fn download_bytes(bytes: &[u8], filename: &str, mime: &str) -> Result<(), DownloadError> {
    let url = ObjectUrl::from_bytes(bytes, mime)?;
    click_anchor(url.as_str(), filename)
    // `url` is revoked here, after the click has started the download.
}

/// Fetch `url` and offer the response body as a download named
/// `filename`.
///
/// # Errors
///
/// Returns [`DownloadError::Status`] for a non-2xx response and
/// [`DownloadError::JsError`] if the fetch itself fails (network error,
/// CORS) or the body cannot be read.
#[allow(clippy::future_not_send)] // WASM is single-threaded; JsFuture is !Send
pub async fn download_remote(url: &str, filename: &str) -> Result<(), DownloadError> {
    let window =
        web_sys::window().ok_or_else(|| DownloadError::JsError("no global window".into()))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()
        .map_err(|e| DownloadError::JsError(format!("fetch did not return a Response: {e:?}")))?;
    if !response.ok() {
        return Err(DownloadError::Status(response.status()));
    }

    let mime = response
        .headers()
        .get("content-type")
        .ok()
        .flatten()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_RESULT_MIME.to_owned());
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    log::debug!("downloading {} bytes as {filename}", bytes.len());
    download_bytes(&bytes, filename, &mime)
}

/// Click a temporary `<a href download>` element.
fn click_anchor(href: &str, filename: &str) -> Result<(), DownloadError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| DownloadError::JsError(format!("failed to cast element: {e:?}")))?;

    anchor.set_href(href);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| DownloadError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();

    // The download is already initiated; a failed removal is not a
    // failed download.
    let _ = body.remove_child(&anchor);

    Ok(())
}
