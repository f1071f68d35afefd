use http::{HeaderMap, Method, Uri};

use sorrel_config::Config;
use sorrel_federation::http_signatures::verify::{
    parse_http_signature,
    verify_http_signature,
    HttpSignatureVerificationError as HttpSignatureError,
};
use sorrel_federation::utils::key_id_to_actor_id;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::profiles::types::DbActorProfile;
use sorrel_utils::crypto_rsa::{
    deserialize_rsa_public_key,
    RsaPublicKey,
    RsaSerializationError,
};
use sorrel_utils::http_digest::ContentDigest;

use crate::errors::HandlerError;
use crate::importers::{ActorIdResolver, ApClient};

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error(transparent)]
    HttpSignatureError(#[from] HttpSignatureError),

    #[error("no HTTP signature")]
    NoHttpSignature,

    #[error("invalid key ID")]
    InvalidKeyId,

    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),

    #[error("{0}")]
    ImportError(String),

    #[error("{0}")]
    ActorError(&'static str),

    #[error("invalid RSA public key")]
    InvalidRsaPublicKey(#[from] RsaSerializationError),

    #[error("actor and request signer do not match")]
    UnexpectedSigner,
}

async fn get_signer(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    signer_id: &str,
    force_refetch: bool,
) -> Result<DbActorProfile, AuthenticationError> {
    let ap_client = ApClient::new(config);
    let mut resolver = ActorIdResolver::default().only_remote();
    if force_refetch {
        resolver = resolver.force_refetch();
    };
    // Signer is fetched over the network if it is not known yet
    let signer = match resolver.resolve(
        &ap_client,
        db_client,
        signer_id,
    ).await {
        Ok(profile) => profile,
        Err(HandlerError::DatabaseError(error)) => return Err(error.into()),
        Err(other_error) => {
            return Err(AuthenticationError::ImportError(other_error.to_string()));
        },
    };
    assert!(!signer.is_local(), "signer should not be local actor");
    Ok(signer)
}

fn get_signer_rsa_key(
    profile: &DbActorProfile,
    key_id: &str,
) -> Result<RsaPublicKey, AuthenticationError> {
    let actor_key = profile.public_keys
        .find_by_key_id(key_id)
        .ok_or(AuthenticationError::ActorError("key not found"))?;
    let rsa_public_key = deserialize_rsa_public_key(&actor_key.public_key_pem)?;
    Ok(rsa_public_key)
}

/// Verifies HTTP signature and returns the signing actor
pub async fn verify_signed_request(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    request_method: &Method,
    request_uri: &Uri,
    request_headers: &HeaderMap,
    content_digest: ContentDigest,
) -> Result<DbActorProfile, AuthenticationError> {
    let signature_data = match parse_http_signature(
        request_method,
        request_uri,
        request_headers,
    ) {
        Ok(signature_data) => signature_data,
        Err(HttpSignatureError::NoSignature) => {
            return Err(AuthenticationError::NoHttpSignature);
        },
        Err(other_error) => return Err(other_error.into()),
    };
    let signer_id = key_id_to_actor_id(&signature_data.key_id)
        .map_err(|_| AuthenticationError::InvalidKeyId)?;
    let signer = get_signer(config, db_client, &signer_id, false).await?;
    let (signer, signer_key) = match get_signer_rsa_key(
        &signer,
        &signature_data.key_id,
    ) {
        Ok(signer_key) => (signer, signer_key),
        Err(AuthenticationError::ActorError(_)) => {
            // The key might have been rotated; fetch the actor again
            let signer = get_signer(config, db_client, &signer_id, true).await?;
            let signer_key = get_signer_rsa_key(
                &signer,
                &signature_data.key_id,
            )?;
            (signer, signer_key)
        },
        Err(other_error) => return Err(other_error),
    };

    verify_http_signature(
        &signature_data,
        &signer_key,
        Some(content_digest),
    )?;

    Ok(signer)
}

#[cfg(test)]
mod tests {
    use sorrel_models::profiles::types::{DbActorKey, DbPublicKeys};
    use sorrel_utils::crypto_rsa::{
        generate_weak_rsa_key,
        rsa_public_key_to_pkcs8_pem,
    };
    use super::*;

    #[test]
    fn test_get_signer_rsa_key() {
        let secret_key = generate_weak_rsa_key().unwrap();
        let public_key = RsaPublicKey::from(&secret_key);
        let public_key_pem = rsa_public_key_to_pkcs8_pem(&public_key).unwrap();
        let key_id = "https://peer.example/users/1#main-key";
        let profile = DbActorProfile {
            public_keys: DbPublicKeys(vec![DbActorKey {
                id: key_id.to_string(),
                public_key_pem,
            }]),
            ..Default::default()
        };
        let signer_key = get_signer_rsa_key(&profile, key_id).unwrap();
        assert_eq!(signer_key, public_key);
    }

    #[test]
    fn test_get_signer_rsa_key_not_found() {
        let profile = DbActorProfile::default();
        let result = get_signer_rsa_key(
            &profile,
            "https://peer.example/users/1#main-key",
        );
        assert!(matches!(
            result,
            Err(AuthenticationError::ActorError("key not found")),
        ));
    }
}
