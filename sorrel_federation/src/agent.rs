use crate::http_signatures::create::HttpSigner;

pub struct FederationAgent {
    /// User-Agent string
    pub user_agent: Option<String>,
    // https://www.w3.org/TR/activitypub/#security-localhost
    pub ssrf_protection_enabled: bool,
    // Disabled for plain-HTTP development setups
    pub tls_verification_enabled: bool,

    pub response_size_limit: usize,
    pub fetcher_timeout: u64,
    pub deliverer_timeout: u64,

    /// Key for creating HTTP signatures
    pub signer: Option<HttpSigner>,
}
