use sorrel_config::Instance;
use sorrel_models::users::types::User;
use sorrel_utils::crypto_rsa::{
    rsa_public_key_to_pkcs8_pem,
    RsaPublicKey,
    RsaSerializationError,
};

use crate::contexts::build_default_context;
use crate::identifiers::{
    local_actor_id,
    local_actor_key_id,
    local_instance_actor_id,
    LocalActorCollection,
};
use crate::vocabulary::{APPLICATION, KEY, PERSON};

use super::types::{Actor, PublicKey};

pub fn build_local_actor(
    instance_url: &str,
    user: &User,
) -> Result<Actor, RsaSerializationError> {
    let actor_id = local_actor_id(instance_url, user.id);
    let public_key = RsaPublicKey::from(&user.rsa_secret_key);
    let public_key_pem = rsa_public_key_to_pkcs8_pem(&public_key)?;
    let actor = Actor {
        _context: Some(serde_json::to_value(build_default_context())
            .expect("context should be serializable")),
        id: actor_id.clone(),
        object_type: PERSON.to_string(),
        name: user.profile.display_name.clone(),
        preferred_username: user.profile.username.clone(),
        inbox: LocalActorCollection::Inbox.of(&actor_id),
        outbox: LocalActorCollection::Outbox.of(&actor_id),
        followers: Some(LocalActorCollection::Followers.of(&actor_id)),
        following: Some(LocalActorCollection::Following.of(&actor_id)),
        public_key: PublicKey {
            id: local_actor_key_id(&actor_id),
            key_type: KEY.to_string(),
            owner: actor_id,
            public_key_pem,
        },
        // No shared inbox is configured for local actors
        endpoints: None,
        summary: user.profile.bio.clone(),
    };
    Ok(actor)
}

/// Service actor that signs requests made on the instance's own behalf
pub fn build_instance_actor(
    instance: &Instance,
) -> Result<Actor, RsaSerializationError> {
    let actor_id = local_instance_actor_id(&instance.url());
    let public_key = RsaPublicKey::from(&instance.rsa_secret_key);
    let public_key_pem = rsa_public_key_to_pkcs8_pem(&public_key)?;
    let actor = Actor {
        _context: Some(serde_json::to_value(build_default_context())
            .expect("context should be serializable")),
        id: actor_id.clone(),
        object_type: APPLICATION.to_string(),
        name: None,
        preferred_username: instance.hostname(),
        inbox: LocalActorCollection::Inbox.of(&actor_id),
        outbox: LocalActorCollection::Outbox.of(&actor_id),
        followers: None,
        following: None,
        public_key: PublicKey {
            id: local_actor_key_id(&actor_id),
            key_type: KEY.to_string(),
            owner: actor_id,
            public_key_pem,
        },
        endpoints: None,
        summary: None,
    };
    Ok(actor)
}

#[cfg(test)]
mod tests {
    use sorrel_config::Instance;
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_build_local_actor() {
        let user = User::default();
        let actor = build_local_actor(INSTANCE_URL, &user).unwrap();
        assert_eq!(
            actor.id,
            format!("{}/api/users/{}", INSTANCE_URL, user.id),
        );
        assert_eq!(actor.object_type, "Person");
        assert_eq!(actor.inbox, format!("{}/inbox", actor.id));
        assert_eq!(actor.outbox, format!("{}/outbox", actor.id));
        assert_eq!(
            actor.followers.as_deref(),
            Some(format!("{}/followers", actor.id).as_str()),
        );
        assert_eq!(actor.public_key.id, format!("{}#main-key", actor.id));
        assert_eq!(actor.public_key.owner, actor.id);
        assert_eq!(
            actor.public_key.public_key_pem.contains("BEGIN PUBLIC KEY"),
            true,
        );
    }

    #[test]
    fn test_build_instance_actor() {
        let instance = Instance::for_test(INSTANCE_URL);
        let actor = build_instance_actor(&instance).unwrap();
        assert_eq!(actor.id, "https://social.example/actor");
        assert_eq!(actor.object_type, "Application");
        assert_eq!(actor.preferred_username, "social.example");
    }
}
