//! Blocking HTTP client for the image API.

use std::time::Duration;

use reqwest::blocking::{Client, multipart};
use visionary_mask::{
    ApiConfig, ApiError, ApiRequest, EnhanceRequest, FormValue, GenerateRequest, ResultLocator,
    decode_enhanced, decode_gallery, decode_reply,
};

/// Build the HTTP client, honoring the configured timeout.
///
/// # Errors
///
/// [`ApiError::Transport`] if the TLS backend cannot be initialised.
pub fn client(config: &ApiConfig) -> Result<Client, ApiError> {
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(transport)
}

/// Turn the request's form parts into a multipart body.
fn form(request: &impl ApiRequest) -> Result<multipart::Form, ApiError> {
    let mut form = multipart::Form::new();
    for part in request.parts() {
        form = match &part.value {
            FormValue::Text(text) => form.text(part.name, text.clone()),
            FormValue::File {
                bytes,
                filename,
                mime,
            } => {
                let file = multipart::Part::bytes(bytes.clone())
                    .file_name(filename.clone())
                    .mime_str(mime)
                    .map_err(transport)?;
                form.part(part.name, file)
            }
        };
    }
    Ok(form)
}

/// POST an edit or product request and decode the single result URL.
///
/// # Errors
///
/// - [`ApiError::Transport`] if the request could not be sent or the
///   body could not be read.
/// - Any error [`decode_reply`] reports for the response.
pub fn submit(
    client: &Client,
    config: &ApiConfig,
    request: &impl ApiRequest,
) -> Result<ResultLocator, ApiError> {
    let (status, body) = post(client, config, request)?;
    decode_reply(status, &body)
}

/// POST a generation request and decode every image URL.
///
/// # Errors
///
/// As [`submit`], with [`decode_gallery`] doing the decoding.
pub fn generate(
    client: &Client,
    config: &ApiConfig,
    request: &GenerateRequest,
) -> Result<Vec<String>, ApiError> {
    let (status, body) = post(client, config, request)?;
    decode_gallery(status, &body)
}

/// POST a prompt for enhancement and return the rewritten prompt.
///
/// # Errors
///
/// As [`submit`], with [`decode_enhanced`] doing the decoding.
pub fn enhance(
    client: &Client,
    config: &ApiConfig,
    request: &EnhanceRequest,
) -> Result<String, ApiError> {
    let (status, body) = post(client, config, request)?;
    decode_enhanced(status, &body)
}

fn post(
    client: &Client,
    config: &ApiConfig,
    request: &impl ApiRequest,
) -> Result<(u16, Vec<u8>), ApiError> {
    let url = config.endpoint_url(request.endpoint());
    log::info!("POST {url}");
    let response = client
        .post(&url)
        .multipart(form(request)?)
        .send()
        .map_err(transport)?;
    let status = response.status().as_u16();
    let body = response.bytes().map_err(transport)?;
    log::debug!("{url} answered {status} ({} bytes)", body.len());
    Ok((status, body.to_vec()))
}

/// Fetch the edited image at `url`.
///
/// # Errors
///
/// [`ApiError::Transport`] on network failure, or [`ApiError::Status`]
/// if the server does not answer with success.
pub fn download(client: &Client, url: &str) -> Result<Vec<u8>, ApiError> {
    log::info!("GET {url}");
    let response = client.get(url).send().map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: format!("could not download {url}"),
        });
    }
    Ok(response.bytes().map_err(transport)?.to_vec())
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}
