//! Create HTTP signatures
use chrono::Utc;
use http::Method;
use thiserror::Error;

use sorrel_utils::{
    base64,
    crypto_rsa::{
        create_rsa_sha256_signature,
        RsaError,
        RsaSecretKey,
    },
    http_digest::{create_digest_header, ContentDigest},
    urls::{get_host, parse_url},
};

const HTTP_SIGNATURE_ALGORITHM: &str = "rsa-sha256";
// https://www.rfc-editor.org/rfc/rfc9110#http.date
const HTTP_SIGNATURE_DATE_FORMAT: &str = "%a, %d %b %Y %T GMT";

/// Entity that creates an HTTP signature
pub struct HttpSigner {
    pub key: RsaSecretKey,
    pub key_id: String,
}

impl HttpSigner {
    pub fn new_rsa(key: RsaSecretKey, key_id: String) -> Self {
        Self { key, key_id }
    }
}

/// HTTP headers for a signed request (Draft-Cavage)
pub struct HttpSignatureHeaders {
    pub host: String,
    pub date: String,
    pub digest: Option<String>,
    pub signature: String,
}

#[derive(Debug, Error)]
pub enum HttpSignatureError {
    #[error("invalid request URL")]
    UrlError,

    #[error("signing error")]
    SigningError(#[from] RsaError),
}

/// Creates HTTP signature according to the HTTP Signatures spec
/// <https://datatracker.ietf.org/doc/html/draft-cavage-http-signatures>
pub fn create_http_signature(
    request_method: Method,
    request_url: &str,
    maybe_request_body: Option<&[u8]>,
    maybe_content_type: Option<&str>,
    signer: &HttpSigner,
) -> Result<HttpSignatureHeaders, HttpSignatureError> {
    let request_uri = parse_url(request_url)
        .map_err(|_| HttpSignatureError::UrlError)?;
    let request_target = format!(
        "{} {}",
        request_method.as_str().to_lowercase(),
        request_uri.path(),
    );
    let host = get_host(request_url)
        .map_err(|_| HttpSignatureError::UrlError)?;
    let date = Utc::now().format(HTTP_SIGNATURE_DATE_FORMAT).to_string();
    let maybe_digest_header = maybe_request_body.map(|body| {
        let digest = ContentDigest::new(body);
        create_digest_header(&digest)
    });

    let mut headers = vec![
        ("(request-target)", &request_target),
        ("host", &host),
        ("date", &date),
    ];
    if let Some(digest_header) = maybe_digest_header.as_ref() {
        headers.push(("digest", digest_header));
    };
    let maybe_content_type = maybe_content_type.map(|val| val.to_string());
    if let Some(content_type) = maybe_content_type.as_ref() {
        headers.push(("content-type", content_type));
    };

    let signature_base = headers.iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<String>>()
        .join("\n");
    let headers_parameter = headers.iter()
        .map(|(name, _)| name.to_string())
        .collect::<Vec<String>>()
        .join(" ");
    let signature = create_rsa_sha256_signature(
        &signer.key,
        signature_base.as_bytes(),
    )?;
    let signature_parameter = base64::encode(signature);
    let signature_header = format!(
        r#"keyId="{}",algorithm="{}",headers="{}",signature="{}""#,
        signer.key_id,
        HTTP_SIGNATURE_ALGORITHM,
        headers_parameter,
        signature_parameter,
    );
    let headers = HttpSignatureHeaders {
        host,
        date,
        digest: maybe_digest_header,
        signature: signature_header,
    };
    Ok(headers)
}
