use std::str::FromStr;

use super::config::Config;
use super::environment::Environment;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

struct EnvConfig {
    config_path: String,
    environment: Option<Environment>,
}

fn parse_env() -> EnvConfig {
    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or(DEFAULT_CONFIG_PATH.to_string());
    let environment = std::env::var("ENVIRONMENT").ok()
        .map(|val| Environment::from_str(&val).expect("invalid environment type"));
    EnvConfig {
        config_path,
        environment,
    }
}

fn env_override<T: FromStr>(key: &'static str, field: &mut T) -> () {
    if let Ok(value) = std::env::var(key) {
        *field = value.parse()
            .unwrap_or_else(|_| panic!("invalid {} value", key));
    };
}

// Settings can be overridden with environment variables
fn apply_env_overrides(config: &mut Config) -> () {
    env_override("DATABASE_URL", &mut config.database_url);
    env_override("HOSTNAME", &mut config.hostname);
    env_override("HTTP_SCHEME", &mut config.http_scheme);
    env_override("ALLOW_REGISTER", &mut config.registrations_open);
    env_override("INSTANCE_NAME", &mut config.instance_name);
    env_override("INSTANCE_DESCRIPTION", &mut config.instance_description);
    env_override(
        "OUTBOUND_TIMEOUT_SECONDS",
        &mut config.federation.outbound_timeout,
    );
    env_override("REMOTE_ACTOR_TTL", &mut config.federation.remote_actor_ttl);
    env_override(
        "DELIVERY_MAX_ATTEMPTS",
        &mut config.federation.delivery_max_attempts,
    );
    env_override(
        "DELIVERY_BACKOFF_BASE",
        &mut config.federation.delivery_backoff_base,
    );
}

pub fn parse_config() -> (Config, Vec<&'static str>) {
    let env = parse_env();
    let config_yaml = std::fs::read_to_string(&env.config_path)
        .expect("failed to load config file");
    let mut config = serde_yaml::from_str::<Config>(&config_yaml)
        .expect("invalid yaml data");
    let mut warnings = vec![];

    // Set parameters from environment
    config.config_path = env.config_path;
    if let Some(environment) = env.environment {
        // Overwrite default only if ENVIRONMENT variable is set
        config.environment = environment;
    };
    apply_env_overrides(&mut config);

    // Validate config
    if config.hostname.is_empty() {
        panic!("HOSTNAME must be specified");
    };
    if !matches!(config.http_scheme.as_str(), "http" | "https") {
        panic!("HTTP_SCHEME must be 'http' or 'https'");
    };
    if config.http_scheme == "http" &&
        !matches!(config.environment, Environment::Development)
    {
        warnings.push("TLS verification is disabled outside of development");
    };
    if !config.storage_dir.exists() {
        panic!("storage directory does not exist");
    };

    (config, warnings)
}
