//! Status mapping and body decoding shared by the adapters. Each endpoint
//! picks one of these decoders so wire-shape quirks stay in this layer.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::contract::error::{PersonnelError, PersonnelResult};

/// Longest error body carried into an error value.
const MAX_ERROR_BODY: usize = 512;

/// Pass 2xx through; turn everything else into an error. A 409 becomes
/// `Conflict`, using `conflict` as the message when the endpoint has one.
pub(crate) async fn expect_success(
    response: Response,
    conflict: Option<&str>,
) -> PersonnelResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = error_body(response).await;
    debug!(status = status.as_u16(), body = %body, "request rejected");
    if status == StatusCode::CONFLICT {
        let message = conflict.map(str::to_string).unwrap_or(body);
        return Err(PersonnelError::conflict(message));
    }
    Err(PersonnelError::http(status.as_u16(), body))
}

async fn error_body(response: Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body.trim().to_string()
}

pub(crate) async fn json<T: DeserializeOwned>(
    response: Response,
    conflict: Option<&str>,
) -> PersonnelResult<T> {
    let bytes = expect_success(response, conflict).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// A list endpoint, accepting a bare array or a page object.
pub(crate) async fn list<T: DeserializeOwned>(response: Response) -> PersonnelResult<paging::ListBody<T>> {
    let bytes = expect_success(response, None).await?.bytes().await?;
    Ok(paging::decode_list(&bytes)?)
}

/// Success with a body nobody needs.
pub(crate) async fn empty(response: Response, conflict: Option<&str>) -> PersonnelResult<()> {
    expect_success(response, conflict).await.map(|_| ())
}

/// `base` with `segments` appended as path segments.
pub(crate) fn join(base: &Url, segments: &[&str]) -> PersonnelResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PersonnelError::validation("base_url", format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
