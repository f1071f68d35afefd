mod config;
mod environment;
mod federation;
mod instance;
mod loader;

pub use config::Config;
pub use environment::Environment;
pub use federation::FederationConfig;
pub use instance::Instance;
pub use loader::parse_config;

pub const SOFTWARE_NAME: &str = "Sorrel";
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SOFTWARE_REPOSITORY: &str = "https://codeberg.org/sorrel/sorrel";

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct ConfigError(pub &'static str);
