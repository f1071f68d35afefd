use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue};

use sorrel_federation::addresses::ActorAddress;
use sorrel_models::profiles::types::DbActor;
use sorrel_utils::urls::get_hostname;

use crate::errors::ValidationError;

#[derive(Clone, Deserialize, Serialize)]
#[cfg_attr(test, derive(Default))]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    pub id: String,

    #[serde(rename = "type")]
    pub key_type: String,

    pub owner: String,
    pub public_key_pem: String,
}

#[derive(Clone, Deserialize, Serialize)]
#[cfg_attr(test, derive(Default))]
#[serde(rename_all = "camelCase")]
pub struct ActorEndpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_inbox: Option<String>,
}

#[derive(Deserialize, Serialize)]
#[cfg_attr(test, derive(Default))]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(
        rename = "@context",
        skip_serializing_if = "Option::is_none",
    )]
    pub _context: Option<JsonValue>,

    pub id: String,

    #[serde(rename = "type")]
    pub object_type: String,

    pub name: Option<String>,
    pub preferred_username: String,

    pub inbox: String,
    pub outbox: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<String>,

    pub public_key: PublicKey,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<ActorEndpoints>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Actor {
    pub fn address(&self) -> Result<ActorAddress, ValidationError> {
        let hostname = get_hostname(&self.id)
            .map_err(|_| ValidationError("invalid actor ID"))?;
        let actor_address = ActorAddress::new_unchecked(
            &self.preferred_username,
            &hostname,
        );
        Ok(actor_address)
    }

    pub fn shared_inbox(&self) -> Option<&str> {
        self.endpoints.as_ref()
            .and_then(|endpoints| endpoints.shared_inbox.as_deref())
    }

    pub fn into_db_actor(self) -> DbActor {
        let shared_inbox = self.shared_inbox().map(|url| url.to_string());
        DbActor {
            id: self.id,
            inbox: self.inbox,
            outbox: self.outbox,
            followers: self.followers,
            shared_inbox,
            url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_get_actor_address() {
        let actor = Actor {
            id: "https://remote.example/users/1".to_string(),
            preferred_username: "test".to_string(),
            ..Default::default()
        };
        let actor_address = actor.address().unwrap();
        assert_eq!(actor_address.to_string(), "test@remote.example");
    }

    #[test]
    fn test_deserialize_actor_with_shared_inbox() {
        let actor_value = json!({
            "id": "https://remote.example/users/1",
            "type": "Person",
            "name": "Test",
            "preferredUsername": "test",
            "inbox": "https://remote.example/users/1/inbox",
            "outbox": "https://remote.example/users/1/outbox",
            "followers": "https://remote.example/users/1/followers",
            "following": "https://remote.example/users/1/following",
            "publicKey": {
                "id": "https://remote.example/users/1#main-key",
                "type": "Key",
                "owner": "https://remote.example/users/1",
                "publicKeyPem": "-----BEGIN PUBLIC KEY-----",
            },
            "endpoints": {
                "sharedInbox": "https://remote.example/inbox",
            },
        });
        let actor: Actor = serde_json::from_value(actor_value).unwrap();
        assert_eq!(actor.shared_inbox(), Some("https://remote.example/inbox"));
        let db_actor = actor.into_db_actor();
        assert_eq!(
            db_actor.shared_inbox.as_deref(),
            Some("https://remote.example/inbox"),
        );
    }
}
