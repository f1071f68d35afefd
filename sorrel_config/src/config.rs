use std::path::PathBuf;

use log::{Level as LogLevel};
use serde::Deserialize;

use sorrel_utils::crypto_rsa::RsaSecretKey;

use super::environment::Environment;
use super::federation::FederationConfig;
use super::instance::Instance;

fn default_log_level() -> LogLevel { LogLevel::Info }

fn default_http_scheme() -> String { "https".to_string() }
const fn default_registrations_open() -> bool { true }
fn default_storage_dir() -> PathBuf { PathBuf::from("files") }

#[derive(Clone, Deserialize)]
pub struct Config {
    // Properties auto-populated from the environment
    #[serde(skip)]
    pub environment: Environment,

    #[serde(skip)]
    pub config_path: String,

    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    pub database_url: String,
    pub database_connection_pool_size: Option<usize>,

    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    pub http_host: String,
    pub http_port: u32,

    // Authority used to mint local URIs
    pub hostname: String,
    #[serde(default = "default_http_scheme")]
    pub http_scheme: String,

    #[serde(default = "default_registrations_open")]
    pub registrations_open: bool,

    pub instance_name: String,
    #[serde(default)]
    pub instance_description: String,

    #[serde(default)]
    pub federation: FederationConfig,

    // Populated during the init phase
    #[serde(skip)]
    pub(super) instance_rsa_key: Option<RsaSecretKey>,
}

impl Config {
    pub fn set_instance_rsa_key(&mut self, secret_key: RsaSecretKey) -> () {
        assert!(
            self.instance_rsa_key.is_none(),
            "instance RSA key can not be replaced",
        );
        self.instance_rsa_key = Some(secret_key);
    }

    pub fn http_socket(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn instance(&self) -> Instance {
        Instance::from_config(self)
    }

    pub fn instance_url(&self) -> String {
        self.instance().url()
    }
}
