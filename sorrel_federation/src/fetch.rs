//! Retrieving remote objects
use reqwest::{
    header,
    Method,
    StatusCode,
    Url,
};
use serde_json::{Value as JsonValue};
use thiserror::Error;

use sorrel_utils::urls::is_same_origin;

use crate::agent::FederationAgent;
use crate::constants::{AP_MEDIA_TYPE, AS_MEDIA_TYPE};
use crate::http_client::{
    build_http_request,
    create_http_client,
    describe_request_error,
    limited_response,
    sign_http_request,
    RedirectAction,
    UnsafeUrlError,
    REDIRECT_LIMIT,
};
use crate::http_signatures::create::HttpSignatureError;
use crate::utils::extract_media_type;

/// Errors that may occur when fetching an object
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    SignatureError(#[from] HttpSignatureError),

    #[error("invalid URL")]
    UrlError,

    #[error(transparent)]
    UnsafeUrl(#[from] UnsafeUrlError),

    #[error("{}", describe_request_error(.0))]
    RequestError(#[from] reqwest::Error),

    // 0: current url
    #[error("access denied: {0}")]
    Forbidden(String),

    // 0: current url
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("redirection error")]
    RedirectionError,

    #[error("response size exceeds limit")]
    ResponseTooLarge,

    // 0: current url
    #[error("json parse error: {0}")]
    JsonParseError(String),

    // 0: content type
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),

    // 0: current url
    #[error("object without ID at {0}")]
    NoObjectId(String),

    // 0: current url
    #[error("unexpected object ID at {0}")]
    UnexpectedObjectId(String),

    #[error("too many objects")]
    RecursionError,
}

fn fetcher_error_for_status(error: reqwest::Error) -> FetchError {
    match (error.url(), error.status()) {
        (Some(url), Some(StatusCode::FORBIDDEN)) => {
            FetchError::Forbidden(url.to_string())
        },
        (Some(url), Some(StatusCode::NOT_FOUND)) => {
            FetchError::NotFound(url.to_string())
        },
        (Some(url), Some(StatusCode::GONE)) => {
            FetchError::NotFound(url.to_string())
        },
        _ => error.into(),
    }
}

/// Returns next URL in redirection chain
fn get_target_url(
    current_url: &Url,
    location: &str, // "Location" header value
) -> Result<Url, String> {
    let next_url = current_url.join(location)
        .map_err(|error| error.to_string())?;
    Ok(next_url)
}

/// Sends signed GET request and returns the fetched ActivityPub object
pub async fn fetch_object(
    agent: &FederationAgent,
    object_id: &str,
) -> Result<JsonValue, FetchError> {
    // Don't follow redirects automatically,
    // because the request needs to be signed again after every redirect
    let client = create_http_client(
        agent,
        agent.fetcher_timeout,
        RedirectAction::None,
    )?;

    let mut redirect_count = 0;
    let mut target_url = object_id.to_owned();
    let response = loop {
        let mut request_builder =
            build_http_request(agent, &client, Method::GET, &target_url)?
                .header(header::ACCEPT, AP_MEDIA_TYPE);

        if let Some(ref signer) = agent.signer {
            request_builder = sign_http_request(
                request_builder,
                Method::GET,
                &target_url,
                None,
                None,
                signer,
            )?;
        };
        let response = request_builder
            .send().await?
            .error_for_status()
            .map_err(fetcher_error_for_status)?;
        if !response.status().is_redirection() {
            break response;
        };
        // Redirected
        redirect_count += 1;
        if redirect_count >= REDIRECT_LIMIT {
            return Err(FetchError::RedirectionError);
        };
        target_url = response.headers()
            .get(header::LOCATION)
            .and_then(|location| location.to_str().ok())
            .and_then(|location| get_target_url(response.url(), location).ok())
            .ok_or(FetchError::RedirectionError)?
            .to_string();
    };

    let object_location = response.url().clone();
    let content_type = response.headers()
        .get(header::CONTENT_TYPE)
        .and_then(extract_media_type)
        .unwrap_or_default();

    let object_bytes = limited_response(response, agent.response_size_limit)
        .await
        .ok_or(FetchError::ResponseTooLarge)?;
    let object_json: JsonValue = serde_json::from_slice(&object_bytes)
        .map_err(|_| FetchError::JsonParseError(object_location.to_string()))?;
    let object_id = object_json["id"].as_str()
        .ok_or(FetchError::NoObjectId(object_location.to_string()))?;

    // The object must come from its own origin
    let is_trusted = is_same_origin(object_location.as_str(), object_id)
        .unwrap_or(false);
    if !is_trusted {
        return Err(FetchError::UnexpectedObjectId(object_location.to_string()));
    };

    const ALLOWED_TYPES: [&str; 3] = [
        AP_MEDIA_TYPE,
        AS_MEDIA_TYPE,
        "application/ld+json",
    ];
    if !ALLOWED_TYPES.contains(&content_type.as_str()) {
        return Err(FetchError::UnexpectedContentType(content_type));
    };

    Ok(object_json)
}

/// Fetches arbitrary JSON data (unsigned request)
pub async fn fetch_json(
    agent: &FederationAgent,
    url: &str,
    query: &[(&str, &str)],
    accept: Option<&str>,
) -> Result<JsonValue, FetchError> {
    const APPLICATION_JSON: &str = "application/json";
    // Redirects are allowed
    let client = create_http_client(
        agent,
        agent.fetcher_timeout,
        RedirectAction::Follow,
    )?;
    let request_builder =
        build_http_request(agent, &client, Method::GET, url)?;
    let response = request_builder
        .query(query)
        .header(header::ACCEPT, accept.unwrap_or(APPLICATION_JSON))
        .send()
        .await?
        .error_for_status()
        .map_err(fetcher_error_for_status)?;
    let response_url = response.url().to_string();
    let data = limited_response(response, agent.response_size_limit)
        .await
        .ok_or(FetchError::ResponseTooLarge)?;
    let object_json = serde_json::from_slice(&data)
        .map_err(|_| FetchError::JsonParseError(response_url))?;
    Ok(object_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_target_url() {
        let current_url = Url::parse("https://social.example/users/1").unwrap();
        let location = "https://social.example/actors/1";
        let target_url = get_target_url(&current_url, location).unwrap();
        assert_eq!(
            target_url.to_string(),
            "https://social.example/actors/1",
        );
    }

    #[test]
    fn test_get_target_url_relative() {
        let current_url = Url::parse("https://social.example/users/1").unwrap();
        let location = "/actors/1";
        let target_url = get_target_url(&current_url, location).unwrap();
        assert_eq!(
            target_url.to_string(),
            "https://social.example/actors/1",
        );
    }
}
