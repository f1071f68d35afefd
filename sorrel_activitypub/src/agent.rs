use sorrel_config::Instance;
use sorrel_federation::agent::FederationAgent;
use sorrel_federation::http_signatures::create::HttpSigner;
use sorrel_models::users::types::User;

use crate::identifiers::{
    local_actor_id,
    local_actor_key_id,
    local_instance_actor_id,
};

// Roughly equals to content size limit * collection size limit
const RESPONSE_SIZE_LIMIT: usize = 2_000_000;

pub(crate) fn build_federation_agent_with_key(
    instance: &Instance,
    signer_key: sorrel_utils::crypto_rsa::RsaSecretKey,
    signer_key_id: String,
) -> FederationAgent {
    // Public instances should sign requests and set User-Agent
    let (maybe_user_agent, maybe_signer) = if instance.federation.enabled {
        let signer = HttpSigner::new_rsa(signer_key, signer_key_id);
        (Some(instance.agent()), Some(signer))
    } else {
        (None, None)
    };
    FederationAgent {
        user_agent: maybe_user_agent,
        ssrf_protection_enabled: instance.tls_verification_enabled,
        tls_verification_enabled: instance.tls_verification_enabled,
        response_size_limit: RESPONSE_SIZE_LIMIT,
        fetcher_timeout: instance.federation.outbound_timeout,
        deliverer_timeout: instance.federation.outbound_timeout,
        signer: maybe_signer,
    }
}

pub fn build_federation_agent(
    instance: &Instance,
    maybe_user: Option<&User>,
) -> FederationAgent {
    let (signer_key, signer_key_id) = if let Some(user) = maybe_user {
        let actor_id = local_actor_id(&instance.url(), user.id);
        let actor_key_id = local_actor_key_id(&actor_id);
        (user.rsa_secret_key.clone(), actor_key_id)
    } else {
        let instance_actor_id = local_instance_actor_id(&instance.url());
        let instance_actor_key_id = local_actor_key_id(&instance_actor_id);
        (instance.rsa_secret_key.clone(), instance_actor_key_id)
    };
    build_federation_agent_with_key(instance, signer_key, signer_key_id)
}
