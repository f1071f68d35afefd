//! Deliver activities
use reqwest::{header, StatusCode};
use thiserror::Error;

use crate::agent::FederationAgent;
use crate::constants::AP_MEDIA_TYPE;
use crate::http_client::{
    build_http_request,
    create_http_client,
    describe_request_error,
    limited_response,
    sign_http_request,
    RedirectAction,
    UnsafeUrlError,
};
use crate::http_signatures::create::HttpSignatureError;

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum DelivererError {
    #[error(transparent)]
    HttpSignatureError(#[from] HttpSignatureError),

    #[error("activity serialization error")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    UnsafeUrl(#[from] UnsafeUrlError),

    #[error("{}", describe_request_error(.0))]
    RequestError(#[from] reqwest::Error),

    #[error("response size exceeds limit")]
    ResponseTooLarge,

    #[error("HTTP error {}", .0.status.as_u16())]
    HttpError(Response),
}

impl DelivererError {
    /// Transient failures are retried with backoff;
    /// client errors other than 408 and 429 are terminal.
    /// https://www.w3.org/wiki/ActivityPub/Primer/HTTP_status_codes_for_delivery
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RequestError(_) => true,
            Self::HttpError(response) => {
                response.status.is_server_error() ||
                matches!(
                    response.status,
                    StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS,
                )
            },
            _ => false,
        }
    }
}

/// Delivers an activity to an inbox
pub async fn send_object(
    agent: &FederationAgent,
    object_json: &str,
    inbox_url: &str,
) -> Result<Response, DelivererError> {
    let http_client = create_http_client(
        agent,
        agent.deliverer_timeout,
        RedirectAction::None,
    )?;
    let mut request_builder = build_http_request(
        agent,
        &http_client,
        reqwest::Method::POST,
        inbox_url,
    )?;
    request_builder = request_builder
        .header(header::CONTENT_TYPE, AP_MEDIA_TYPE);
    if let Some(ref signer) = agent.signer {
        request_builder = sign_http_request(
            request_builder,
            reqwest::Method::POST,
            inbox_url,
            Some(object_json.as_bytes()),
            Some(AP_MEDIA_TYPE),
            signer,
        )?;
    };

    let response = request_builder
        .body(object_json.to_owned())
        .send()
        .await?;
    let response_status = response.status();
    let response_data = limited_response(response, agent.response_size_limit)
        .await
        .ok_or(DelivererError::ResponseTooLarge)?;
    let response_text = String::from_utf8(response_data.to_vec())
        // Replace non-UTF8 responses with empty string
        .unwrap_or_default();
    let response = Response { status: response_status, body: response_text };
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(DelivererError::HttpError(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_to_string() {
        let response = Response {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "".to_string(),
        };
        let error = DelivererError::HttpError(response);
        assert_eq!(error.to_string(), "HTTP error 500");
    }

    #[test]
    fn test_http_error_recoverable() {
        let recoverable = [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
        ];
        for status in recoverable {
            let error = DelivererError::HttpError(Response {
                status,
                body: "".to_string(),
            });
            assert_eq!(error.is_recoverable(), true);
        };
        let terminal = [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::GONE,
        ];
        for status in terminal {
            let error = DelivererError::HttpError(Response {
                status,
                body: "".to_string(),
            });
            assert_eq!(error.is_recoverable(), false);
        };
    }
}
