use sorrel_utils::crypto_rsa::RsaSecretKey;
use sorrel_utils::urls::get_hostname;

use super::{
    config::Config,
    environment::Environment,
    federation::FederationConfig,
    SOFTWARE_NAME,
    SOFTWARE_VERSION,
};

#[derive(Clone)]
pub struct Instance {
    _url: String,
    pub federation: FederationConfig,
    // TLS certificate validation is off for plain-HTTP development setups
    pub tls_verification_enabled: bool,
    pub rsa_secret_key: RsaSecretKey,
}

impl Instance {
    pub(crate) fn from_config(config: &Config) -> Self {
        let mut federation_config = config.federation.clone();
        if matches!(config.environment, Environment::Development) {
            // Private instance doesn't send activities and sign requests
            federation_config.enabled = false;
        };
        Self {
            _url: format!("{}://{}", config.http_scheme, config.hostname),
            federation: federation_config,
            tls_verification_enabled: config.http_scheme == "https",
            rsa_secret_key: config.instance_rsa_key.clone()
                .expect("instance RSA key should be already generated"),
        }
    }

    pub fn url(&self) -> String {
        self._url.clone()
    }

    pub fn url_ref(&self) -> &str {
        &self._url
    }

    /// Returns instance host name (without port number)
    pub fn hostname(&self) -> String {
        get_hostname(&self._url)
            .expect("instance URL should be valid")
    }

    pub fn agent(&self) -> String {
        format!(
            "{name} {version}; {instance_url}",
            name=SOFTWARE_NAME,
            version=SOFTWARE_VERSION,
            instance_url=self._url,
        )
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Instance {
    pub fn for_test(url: &str) -> Self {
        use sorrel_utils::crypto_rsa::generate_weak_rsa_key;
        Self {
            _url: url.trim_end_matches('/').to_string(),
            federation: FederationConfig {
                enabled: false,
                ..Default::default()
            },
            tls_verification_enabled: url.starts_with("https"),
            rsa_secret_key: generate_weak_rsa_key().unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_url_https_dns() {
        let instance_url = "https://social.example/";
        let instance = Instance::for_test(instance_url);

        assert_eq!(instance.url(), "https://social.example");
        assert_eq!(instance.hostname(), "social.example");
        assert_eq!(
            instance.agent(),
            format!("Sorrel {}; https://social.example", SOFTWARE_VERSION),
        );
        // Test instance is private
        assert!(!instance.federation.enabled);
    }

    #[test]
    fn test_instance_url_http_ipv4_with_port() {
        let instance_url = "http://1.2.3.4:3777";
        let instance = Instance::for_test(instance_url);

        assert_eq!(instance.url(), "http://1.2.3.4:3777");
        assert_eq!(instance.hostname(), "1.2.3.4");
    }
}
