use std::path::Path;

use sorrel_config::{parse_config, Config};
use sorrel_utils::crypto_rsa::{
    generate_rsa_key,
    rsa_secret_key_from_pkcs8_pem,
    rsa_secret_key_to_pkcs8_pem,
    RsaSecretKey,
};

use crate::logger::configure_logger;

pub fn initialize_app() -> Config {
    let (config, config_warnings) = parse_config();
    configure_logger(config.log_level);
    log::info!("config loaded from {}", config.config_path);
    for warning in config_warnings {
        log::warn!("{}", warning);
    };
    config
}

const INSTANCE_RSA_KEY_FILE: &str = "instance_rsa_key";

/// Reads the instance actor key from the storage directory,
/// generating it on first start
pub fn prepare_instance_rsa_key(storage_dir: &Path) -> RsaSecretKey {
    let secret_key_path = storage_dir.join(INSTANCE_RSA_KEY_FILE);
    if secret_key_path.exists() {
        let secret_key_pem = std::fs::read_to_string(&secret_key_path)
            .expect("failed to read instance RSA key");
        rsa_secret_key_from_pkcs8_pem(&secret_key_pem)
            .expect("failed to parse instance RSA key")
    } else {
        let secret_key = generate_rsa_key()
            .expect("failed to generate instance RSA key");
        let secret_key_pem = rsa_secret_key_to_pkcs8_pem(&secret_key)
            .expect("failed to serialize instance RSA key");
        std::fs::write(&secret_key_path, secret_key_pem)
            .expect("failed to write instance RSA key");
        log::info!("instance RSA key generated");
        secret_key
    }
}
