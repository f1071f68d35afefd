use serde::Deserialize;

const fn default_federation_enabled() -> bool { true }
// Total timeout for one outbound HTTP request
const fn default_outbound_timeout() -> u64 { 3 }
// Remote actor records are re-fetched after this many seconds
const fn default_remote_actor_ttl() -> u64 { 24 * 3600 }
const fn default_delivery_max_attempts() -> u32 { 12 }
const fn default_delivery_backoff_base() -> u32 { 30 }
const fn default_delivery_batch_size() -> u32 { 10 }

#[derive(Clone, Deserialize)]
pub struct FederationConfig {
    #[serde(default = "default_federation_enabled")]
    pub enabled: bool,

    #[serde(default = "default_outbound_timeout")]
    pub outbound_timeout: u64,

    #[serde(default = "default_remote_actor_ttl")]
    pub remote_actor_ttl: u64,

    #[serde(default = "default_delivery_max_attempts")]
    pub delivery_max_attempts: u32,

    #[serde(default = "default_delivery_backoff_base")]
    pub delivery_backoff_base: u32,

    #[serde(default = "default_delivery_batch_size")]
    pub delivery_batch_size: u32,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            enabled: default_federation_enabled(),
            outbound_timeout: default_outbound_timeout(),
            remote_actor_ttl: default_remote_actor_ttl(),
            delivery_max_attempts: default_delivery_max_attempts(),
            delivery_backoff_base: default_delivery_backoff_base(),
            delivery_batch_size: default_delivery_batch_size(),
        }
    }
}
