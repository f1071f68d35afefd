//! Verify HTTP signatures
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use http::{HeaderMap, Method, Uri};
use regex::Regex;

use sorrel_utils::{
    base64,
    crypto_rsa::{verify_rsa_sha256_signature, RsaPublicKey},
    http_digest::{parse_digest_header, ContentDigest},
};

const SIGNATURE_PARAMETER_RE: &str = r#"^(?P<key>[a-zA-Z]+)="?(?P<value>[^"]+)"?$"#;

// Accepted values of the algorithm parameter
const SIGNATURE_ALGORITHMS: [&str; 2] = ["rsa-sha256", "hs2019"];

// Headers that must be signed on inbox POSTs
const REQUIRED_HEADERS_POST: [&str; 4] = ["(request-target)", "host", "date", "digest"];
const REQUIRED_HEADERS_GET: [&str; 3] = ["(request-target)", "host", "date"];

const SIGNATURE_EXPIRES_IN: i64 = 12; // 12 hours

#[derive(thiserror::Error, Debug)]
pub enum HttpSignatureVerificationError {
    #[error("HTTP method not supported")]
    MethodNotSupported,

    #[error("missing signature header")]
    NoSignature,

    #[error("unsupported signature algorithm")]
    UnsupportedAlgorithm,

    #[error("{0}")]
    HeaderError(&'static str),

    #[error("{0}")]
    ParseError(&'static str),

    #[error("invalid encoding")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("signature has expired")]
    Expired,

    #[error("digest mismatch")]
    DigestMismatch,

    #[error("invalid signature")]
    InvalidSignature,
}

type VerificationError = HttpSignatureVerificationError;

pub struct HttpSignatureData {
    pub key_id: String,
    pub message: String, // reconstructed signature base
    pub signature: String, // base64-encoded signature
    pub expires_at: DateTime<Utc>,
    pub content_digest: Option<ContentDigest>,
}

// Header values are trimmed and joined with a comma
// if the header appears multiple times
fn get_header_value(
    request_headers: &HeaderMap,
    header_name: &str,
) -> Result<String, VerificationError> {
    let mut values = vec![];
    for header_value in request_headers.get_all(header_name) {
        let value = header_value.to_str()
            .map_err(|_| VerificationError::HeaderError("invalid header value"))?
            .trim()
            .to_string();
        values.push(value);
    };
    if values.is_empty() {
        return Err(VerificationError::HeaderError("missing header"));
    };
    Ok(values.join(", "))
}

pub fn parse_http_signature(
    request_method: &Method,
    request_uri: &Uri,
    request_headers: &HeaderMap,
) -> Result<HttpSignatureData, VerificationError> {
    // Parse Digest header
    let maybe_digest = match *request_method {
        Method::GET => None,
        Method::POST => {
            let digest_header = get_header_value(request_headers, "digest")
                .map_err(|_| VerificationError::HeaderError("missing 'digest' header"))?;
            let digest = parse_digest_header(&digest_header)
                .map_err(VerificationError::HeaderError)?;
            Some(digest)
        },
        _ => return Err(VerificationError::MethodNotSupported),
    };

    // Parse Signature header
    let signature_header = request_headers.get("signature")
        .ok_or(VerificationError::NoSignature)?
        .to_str()
        .map_err(|_| VerificationError::HeaderError("invalid signature header"))?;

    let signature_parameter_re = Regex::new(SIGNATURE_PARAMETER_RE)
        .expect("regexp should be valid");
    let mut signature_parameters = HashMap::new();
    for item in signature_header.split(',') {
        let caps = signature_parameter_re.captures(item.trim())
            .ok_or(VerificationError::HeaderError("invalid signature header"))?;
        let key = caps["key"].to_string();
        let value = caps["value"].to_string();
        signature_parameters.insert(key, value);
    };

    if let Some(algorithm) = signature_parameters.get("algorithm") {
        if !SIGNATURE_ALGORITHMS.contains(&algorithm.as_str()) {
            return Err(VerificationError::UnsupportedAlgorithm);
        };
    };
    let key_id = signature_parameters.get("keyId")
        .ok_or(VerificationError::ParseError("keyId parameter is missing"))?
        .to_owned();
    let headers_parameter = signature_parameters.get("headers")
        .ok_or(VerificationError::ParseError("headers parameter is missing"))?
        .to_owned();
    let signature = signature_parameters.get("signature")
        .ok_or(VerificationError::ParseError("signature is missing"))?
        .to_owned();

    // All required headers must be signed
    let signed_headers: Vec<&str> = headers_parameter.split(' ').collect();
    let required_headers: &[&str] = if *request_method == Method::POST {
        &REQUIRED_HEADERS_POST
    } else {
        &REQUIRED_HEADERS_GET
    };
    for required in required_headers {
        if !signed_headers.contains(required) {
            return Err(VerificationError::ParseError("incomplete signed header set"));
        };
    };

    let date_str = get_header_value(request_headers, "date")
        .map_err(|_| VerificationError::HeaderError("missing date"))?;
    let created_at = DateTime::parse_from_rfc2822(&date_str)
        .map_err(|_| VerificationError::HeaderError("invalid date"))?
        .with_timezone(&Utc);
    let expires_at = created_at + Duration::hours(SIGNATURE_EXPIRES_IN);

    let mut message_parts = vec![];
    for header in signed_headers {
        let message_part = if header == "(request-target)" {
            format!(
                "(request-target): {} {}",
                request_method.as_str().to_lowercase(),
                request_uri.path(),
            )
        } else {
            // Header names are case-insensitive
            let header_value = get_header_value(request_headers, header)?;
            format!("{}: {}", header.to_lowercase(), header_value)
        };
        message_parts.push(message_part);
    };
    let message = message_parts.join("\n");

    let signature_data = HttpSignatureData {
        key_id,
        message,
        signature,
        expires_at,
        content_digest: maybe_digest,
    };
    Ok(signature_data)
}

pub fn verify_http_signature(
    signature_data: &HttpSignatureData,
    signer_key: &RsaPublicKey,
    content_digest: Option<ContentDigest>,
) -> Result<(), VerificationError> {
    if signature_data.expires_at < Utc::now() {
        return Err(VerificationError::Expired);
    };
    if signature_data.content_digest != content_digest {
        return Err(VerificationError::DigestMismatch);
    };
    let signature = base64::decode(&signature_data.signature)?;
    let is_valid_signature = verify_rsa_sha256_signature(
        signer_key,
        signature_data.message.as_bytes(),
        &signature,
    ).is_ok();
    if !is_valid_signature {
        return Err(VerificationError::InvalidSignature);
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use http::{HeaderName, HeaderValue};
    use sorrel_utils::crypto_rsa::generate_weak_rsa_key;
    use crate::http_signatures::create::{
        create_http_signature,
        HttpSigner,
    };
    use super::*;

    #[test]
    fn test_parse_signature_get() {
        let request_method = Method::GET;
        let request_uri = "/users/123/inbox".parse::<Uri>().unwrap();
        let date = "20 Oct 2022 20:00:00 GMT";
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            HeaderName::from_static("host"),
            HeaderValue::from_static("social.example"),
        );
        request_headers.insert(
            HeaderName::from_static("date"),
            HeaderValue::from_str(date).unwrap(),
        );
        let signature_header = concat!(
            r#"keyId="https://peer.example/actor#main-key","#,
            r#"algorithm=hs2019,"#,
            r#"headers="(request-target) host date","#,
            r#"signature="test""#,
        );
        request_headers.insert(
            HeaderName::from_static("signature"),
            HeaderValue::from_static(signature_header),
        );

        let signature_data = parse_http_signature(
            &request_method,
            &request_uri,
            &request_headers,
        ).unwrap();
        assert_eq!(
            signature_data.key_id,
            "https://peer.example/actor#main-key",
        );
        assert_eq!(
            signature_data.message,
            "(request-target): get /users/123/inbox\nhost: social.example\ndate: 20 Oct 2022 20:00:00 GMT",
        );
        assert_eq!(signature_data.signature, "test");
        assert!(signature_data.expires_at < Utc::now());
        assert!(signature_data.content_digest.is_none());
    }

    #[test]
    fn test_parse_signature_unsupported_algorithm() {
        let request_method = Method::GET;
        let request_uri = "/users/123".parse::<Uri>().unwrap();
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            HeaderName::from_static("host"),
            HeaderValue::from_static("social.example"),
        );
        request_headers.insert(
            HeaderName::from_static("date"),
            HeaderValue::from_static("20 Oct 2022 20:00:00 GMT"),
        );
        let signature_header = concat!(
            r#"keyId="https://peer.example/actor#main-key","#,
            r#"algorithm="rsa-sha1","#,
            r#"headers="(request-target) host date","#,
            r#"signature="test""#,
        );
        request_headers.insert(
            HeaderName::from_static("signature"),
            HeaderValue::from_static(signature_header),
        );
        let result = parse_http_signature(
            &request_method,
            &request_uri,
            &request_headers,
        );
        assert!(matches!(
            result,
            Err(HttpSignatureVerificationError::UnsupportedAlgorithm),
        ));
    }

    #[test]
    fn test_parse_signature_post_requires_digest_in_signed_set() {
        let request_method = Method::POST;
        let request_uri = "/users/123/inbox".parse::<Uri>().unwrap();
        let request_body = "{}";
        let digest = ContentDigest::new(request_body.as_bytes());
        let digest_header =
            sorrel_utils::http_digest::create_digest_header(&digest);
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            HeaderName::from_static("host"),
            HeaderValue::from_static("social.example"),
        );
        request_headers.insert(
            HeaderName::from_static("date"),
            HeaderValue::from_static("20 Oct 2022 20:00:00 GMT"),
        );
        request_headers.insert(
            HeaderName::from_static("digest"),
            HeaderValue::from_str(&digest_header).unwrap(),
        );
        // Digest header exists but is not covered by the signature
        let signature_header = concat!(
            r#"keyId="https://peer.example/actor#main-key","#,
            r#"headers="(request-target) host date","#,
            r#"signature="test""#,
        );
        request_headers.insert(
            HeaderName::from_static("signature"),
            HeaderValue::from_static(signature_header),
        );
        let result = parse_http_signature(
            &request_method,
            &request_uri,
            &request_headers,
        );
        assert!(matches!(
            result,
            Err(HttpSignatureVerificationError::ParseError(_)),
        ));
    }

    fn build_signed_request(
        request_method: &Method,
        request_url: &str,
        maybe_body: Option<&str>,
        signer: &HttpSigner,
    ) -> HeaderMap {
        let signed_headers = create_http_signature(
            request_method.clone(),
            request_url,
            maybe_body.map(|body| body.as_bytes()),
            maybe_body.map(|_| "application/activity+json"),
            signer,
        ).unwrap();
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            HeaderName::from_static("host"),
            HeaderValue::from_str(&signed_headers.host).unwrap(),
        );
        request_headers.insert(
            HeaderName::from_static("date"),
            HeaderValue::from_str(&signed_headers.date).unwrap(),
        );
        if let Some(digest) = signed_headers.digest {
            request_headers.insert(
                HeaderName::from_static("digest"),
                HeaderValue::from_str(&digest).unwrap(),
            );
        };
        if maybe_body.is_some() {
            request_headers.insert(
                HeaderName::from_static("content-type"),
                HeaderValue::from_static("application/activity+json"),
            );
        };
        request_headers.insert(
            HeaderName::from_static("signature"),
            HeaderValue::from_str(&signed_headers.signature).unwrap(),
        );
        request_headers
    }

    #[test]
    fn test_create_and_verify_signature_get() {
        let request_method = Method::GET;
        let request_url = "https://social.example/objects/1";
        let signer_key = generate_weak_rsa_key().unwrap();
        let signer_public_key = RsaPublicKey::from(&signer_key);
        let signer_key_id = "https://peer.example/actor#main-key".to_string();
        let signer = HttpSigner::new_rsa(signer_key, signer_key_id);
        let request_headers = build_signed_request(
            &request_method,
            request_url,
            None,
            &signer,
        );

        let request_uri = "/objects/1".parse::<Uri>().unwrap();
        let signature_data = parse_http_signature(
            &request_method,
            &request_uri,
            &request_headers,
        ).unwrap();
        assert_eq!(signature_data.content_digest.is_some(), false);

        let result = verify_http_signature(
            &signature_data,
            &signer_public_key,
            None,
        );
        assert_eq!(result.is_ok(), true);
    }

    #[test]
    fn test_create_and_verify_signature_post() {
        let request_method = Method::POST;
        let request_url = "https://social.example/users/1/inbox";
        let request_body = r#"{"type":"Follow"}"#;
        let signer_key = generate_weak_rsa_key().unwrap();
        let signer_public_key = RsaPublicKey::from(&signer_key);
        let signer_key_id = "https://peer.example/actor#main-key".to_string();
        let signer = HttpSigner::new_rsa(signer_key, signer_key_id);
        let request_headers = build_signed_request(
            &request_method,
            request_url,
            Some(request_body),
            &signer,
        );

        let request_uri = "/users/1/inbox".parse::<Uri>().unwrap();
        let signature_data = parse_http_signature(
            &request_method,
            &request_uri,
            &request_headers,
        ).unwrap();
        assert_eq!(signature_data.content_digest.is_some(), true);

        let content_digest = ContentDigest::new(request_body.as_bytes());
        let result = verify_http_signature(
            &signature_data,
            &signer_public_key,
            Some(content_digest),
        );
        assert_eq!(result.is_ok(), true);
    }

    #[test]
    fn test_verify_signature_digest_mismatch() {
        let request_method = Method::POST;
        let request_url = "https://social.example/users/1/inbox";
        let request_body = r#"{"type":"Follow"}"#;
        let signer_key = generate_weak_rsa_key().unwrap();
        let signer_public_key = RsaPublicKey::from(&signer_key);
        let signer_key_id = "https://peer.example/actor#main-key".to_string();
        let signer = HttpSigner::new_rsa(signer_key, signer_key_id);
        let request_headers = build_signed_request(
            &request_method,
            request_url,
            Some(request_body),
            &signer,
        );

        let request_uri = "/users/1/inbox".parse::<Uri>().unwrap();
        let signature_data = parse_http_signature(
            &request_method,
            &request_uri,
            &request_headers,
        ).unwrap();

        // Body was replaced in transit
        let tampered_digest = ContentDigest::new(b"something else");
        let result = verify_http_signature(
            &signature_data,
            &signer_public_key,
            Some(tampered_digest),
        );
        assert!(matches!(
            result,
            Err(HttpSignatureVerificationError::DigestMismatch),
        ));
    }
}
