use std::cmp::max;
use std::error::{Error as _};
use std::net::IpAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::{
    header,
    redirect::{Policy as RedirectPolicy},
    Client,
    Error,
    Method,
    RequestBuilder,
    Response,
};
use thiserror::Error;
use url::Url;

use crate::agent::FederationAgent;
use crate::http_signatures::create::{
    create_http_signature,
    HttpSignatureError,
    HttpSigner,
};

const CONNECTION_TIMEOUT: u64 = 30;
pub const REDIRECT_LIMIT: usize = 3;

pub enum RedirectAction {
    None,
    Follow,
}

// https://www.w3.org/TR/activitypub/#security-localhost
fn is_safe_addr(ip_addr: IpAddr) -> bool {
    match ip_addr {
        IpAddr::V4(addr_v4) => !addr_v4.is_loopback() && !addr_v4.is_private(),
        IpAddr::V6(addr_v6) => !addr_v6.is_loopback(),
    }
}

/// Returns false if untrusted URL is not safe for fetching
fn is_safe_url(url: &str) -> bool {
    if let Ok(url) = Url::parse(url) {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        };
        match url.host() {
            Some(url::Host::Ipv4(addr)) => is_safe_addr(IpAddr::V4(addr)),
            Some(url::Host::Ipv6(addr)) => is_safe_addr(IpAddr::V6(addr)),
            // Don't resolve domain names
            Some(url::Host::Domain(_)) => true,
            None => false,
        }
    } else {
        false
    }
}

#[derive(Debug, Error)]
#[error("unsafe URL: {0}")]
pub struct UnsafeUrlError(String);

pub fn require_safe_url(url: &str) -> Result<(), UnsafeUrlError> {
    if !is_safe_url(url) {
        return Err(UnsafeUrlError(url.to_string()));
    };
    Ok(())
}

fn create_safe_redirect_policy() -> RedirectPolicy {
    RedirectPolicy::custom(|attempt| {
        if attempt.previous().len() > REDIRECT_LIMIT {
            attempt.error("too many redirects")
        } else if !is_safe_url(attempt.url().as_str()) {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

pub fn create_http_client(
    agent: &FederationAgent,
    timeout: u64,
    redirect_action: RedirectAction,
) -> reqwest::Result<Client> {
    let mut client_builder = Client::builder();
    let redirect_policy = match redirect_action {
        RedirectAction::None => RedirectPolicy::none(),
        RedirectAction::Follow => {
            if agent.ssrf_protection_enabled {
                create_safe_redirect_policy()
            } else {
                RedirectPolicy::limited(REDIRECT_LIMIT)
            }
        },
    };
    if !agent.tls_verification_enabled {
        client_builder = client_builder.danger_accept_invalid_certs(true);
    };
    let request_timeout = Duration::from_secs(timeout);
    let connect_timeout = Duration::from_secs(max(
        timeout,
        CONNECTION_TIMEOUT,
    ));
    client_builder
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .redirect(redirect_policy)
        .build()
}

pub fn build_http_request(
    agent: &FederationAgent,
    client: &Client,
    method: Method,
    target_url: &str,
) -> Result<RequestBuilder, UnsafeUrlError> {
    if agent.ssrf_protection_enabled {
        require_safe_url(target_url)?;
    };
    let mut request_builder = client.request(method, target_url);
    if let Some(ref user_agent) = agent.user_agent {
        request_builder = request_builder
            .header(header::USER_AGENT, user_agent);
    };
    Ok(request_builder)
}

pub fn sign_http_request(
    mut request_builder: RequestBuilder,
    method: Method,
    target_url: &str,
    maybe_body: Option<&[u8]>,
    maybe_content_type: Option<&str>,
    signer: &HttpSigner,
) -> Result<RequestBuilder, HttpSignatureError> {
    let headers = create_http_signature(
        method,
        target_url,
        maybe_body,
        maybe_content_type,
        signer,
    )?;
    if let Some(digest) = headers.digest {
        request_builder = request_builder.header("Digest", digest);
    };
    request_builder = request_builder
        .header(header::HOST, headers.host)
        .header(header::DATE, headers.date)
        .header("Signature", headers.signature);
    Ok(request_builder)
}

pub async fn limited_response(
    mut response: Response,
    limit: usize,
) -> Option<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = response.chunk().await.ok()? {
        if buffer.len() + chunk.len() > limit {
            return None;
        };
        buffer.extend_from_slice(&chunk);
    };
    Some(buffer.freeze())
}

pub fn describe_request_error(error: &Error) -> String {
    if let Some(source) = error.source() {
        format!("{}: {}", error, source)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_url() {
        assert_eq!(is_safe_url("https://server.example/test"), true);
        assert_eq!(is_safe_url("ftp://user@server.example"), false);
        assert_eq!(is_safe_url("file:///etc/passwd"), false);
        assert_eq!(is_safe_url("http://127.0.0.1:5941/test"), false);
        assert_eq!(is_safe_url("http://[::1]:5941/test"), false);
        assert_eq!(is_safe_url("http://localhost:5941/test"), true);
        assert_eq!(is_safe_url("https://server.local/test"), true);
    }
}
