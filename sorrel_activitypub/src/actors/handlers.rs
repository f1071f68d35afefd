use sorrel_models::database::DatabaseClient;
use sorrel_models::profiles::queries::{create_profile, update_profile};
use sorrel_models::profiles::types::{
    DbActorKey,
    DbActorProfile,
    ProfileCreateData,
    ProfileUpdateData,
};
use sorrel_utils::crypto_rsa::deserialize_rsa_public_key;
use sorrel_utils::urls::{get_hostname, is_same_origin};

use crate::errors::{HandlerError, ValidationError};
use crate::vocabulary::PERSON;

use super::types::Actor;

fn parse_actor_keys(actor: &Actor) -> Result<Vec<DbActorKey>, ValidationError> {
    if actor.public_key.owner != actor.id {
        return Err(ValidationError("key owner is not an actor"));
    };
    deserialize_rsa_public_key(&actor.public_key.public_key_pem)
        .map_err(|_| ValidationError("invalid public key"))?;
    let key = DbActorKey {
        id: actor.public_key.id.clone(),
        public_key_pem: actor.public_key.public_key_pem.clone(),
    };
    Ok(vec![key])
}

fn validate_actor(actor: &Actor) -> Result<(), ValidationError> {
    if actor.object_type != PERSON {
        return Err(ValidationError("unexpected actor type"));
    };
    // Collection URLs must belong to the actor's origin
    if !is_same_origin(&actor.id, &actor.inbox).unwrap_or(false) {
        return Err(ValidationError("inbox has different origin"));
    };
    Ok(())
}

pub async fn create_remote_profile(
    db_client: &impl DatabaseClient,
    actor: Actor,
) -> Result<DbActorProfile, HandlerError> {
    validate_actor(&actor)?;
    let hostname = get_hostname(&actor.id)
        .map_err(|_| ValidationError("invalid actor ID"))?;
    let public_keys = parse_actor_keys(&actor)?;
    let profile_data = ProfileCreateData {
        username: actor.preferred_username.clone(),
        hostname: Some(hostname),
        display_name: actor.name.clone(),
        bio: actor.summary.clone(),
        public_keys,
        actor_json: Some(actor.into_db_actor()),
    };
    let profile = create_profile(db_client, profile_data).await?;
    Ok(profile)
}

/// Merges fetched public keys into the stored set, upserting by key ID
fn upsert_actor_keys(
    stored_keys: &[DbActorKey],
    fetched_keys: Vec<DbActorKey>,
) -> Vec<DbActorKey> {
    let mut keys = stored_keys.to_vec();
    for fetched_key in fetched_keys {
        match keys.iter_mut().find(|key| key.id == fetched_key.id) {
            Some(key) => key.public_key_pem = fetched_key.public_key_pem,
            None => keys.push(fetched_key),
        };
    };
    keys
}

pub async fn update_remote_profile(
    db_client: &impl DatabaseClient,
    profile: DbActorProfile,
    actor: Actor,
) -> Result<DbActorProfile, HandlerError> {
    validate_actor(&actor)?;
    if profile.actor_id.as_deref() != Some(actor.id.as_str()) {
        return Err(ValidationError("actor ID mismatch").into());
    };
    let fetched_keys = parse_actor_keys(&actor)?;
    let public_keys = upsert_actor_keys(
        profile.public_keys.inner(),
        fetched_keys,
    );
    let profile_data = ProfileUpdateData {
        display_name: actor.name.clone(),
        bio: actor.summary.clone(),
        public_keys,
        actor_json: Some(actor.into_db_actor()),
    };
    let profile = update_profile(db_client, profile.id, profile_data).await?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use sorrel_utils::crypto_rsa::{
        generate_weak_rsa_key,
        rsa_public_key_to_pkcs8_pem,
        RsaPublicKey,
    };
    use crate::actors::types::PublicKey;
    use super::*;

    fn build_test_actor(actor_id: &str) -> Actor {
        let secret_key = generate_weak_rsa_key().unwrap();
        let public_key_pem =
            rsa_public_key_to_pkcs8_pem(&RsaPublicKey::from(&secret_key))
                .unwrap();
        Actor {
            id: actor_id.to_string(),
            object_type: PERSON.to_string(),
            preferred_username: "test".to_string(),
            inbox: format!("{}/inbox", actor_id),
            outbox: format!("{}/outbox", actor_id),
            public_key: PublicKey {
                id: format!("{}#main-key", actor_id),
                key_type: "Key".to_string(),
                owner: actor_id.to_string(),
                public_key_pem,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_actor() {
        let actor = build_test_actor("https://remote.example/users/1");
        assert_eq!(validate_actor(&actor).is_ok(), true);
    }

    #[test]
    fn test_validate_actor_wrong_type() {
        let mut actor = build_test_actor("https://remote.example/users/1");
        actor.object_type = "Service".to_string();
        assert_eq!(validate_actor(&actor).is_err(), true);
    }

    #[test]
    fn test_validate_actor_foreign_inbox() {
        let mut actor = build_test_actor("https://remote.example/users/1");
        actor.inbox = "https://other.example/inbox".to_string();
        assert_eq!(validate_actor(&actor).is_err(), true);
    }

    #[test]
    fn test_parse_actor_keys_foreign_owner() {
        let mut actor = build_test_actor("https://remote.example/users/1");
        actor.public_key.owner = "https://remote.example/users/2".to_string();
        assert_eq!(parse_actor_keys(&actor).is_err(), true);
    }

    #[test]
    fn test_upsert_actor_keys() {
        let stored = vec![DbActorKey {
            id: "https://remote.example/users/1#main-key".to_string(),
            public_key_pem: "old".to_string(),
        }];
        let fetched = vec![
            DbActorKey {
                id: "https://remote.example/users/1#main-key".to_string(),
                public_key_pem: "new".to_string(),
            },
            DbActorKey {
                id: "https://remote.example/users/1#other-key".to_string(),
                public_key_pem: "other".to_string(),
            },
        ];
        let keys = upsert_actor_keys(&stored, fetched);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].public_key_pem, "new");
    }
}
