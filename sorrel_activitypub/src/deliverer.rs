use std::collections::HashSet;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de::{Error as DeserializerError},
    ser::{Error as _},
};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use sorrel_config::Instance;
use sorrel_federation::http_signatures::create::HttpSigner;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::profiles::types::DbActor;
use sorrel_models::users::types::User;
use sorrel_utils::crypto_rsa::{
    rsa_secret_key_from_pkcs8_pem,
    rsa_secret_key_to_pkcs8_pem,
    RsaSecretKey,
};

use crate::identifiers::{local_actor_id, local_actor_key_id};
use crate::queues::OutgoingActivityJobData;

fn deserialize_rsa_secret_key<'de, D>(
    deserializer: D,
) -> Result<RsaSecretKey, D::Error>
    where D: Deserializer<'de>
{
    let secret_key_pem = String::deserialize(deserializer)?;
    let secret_key = rsa_secret_key_from_pkcs8_pem(&secret_key_pem)
        .map_err(DeserializerError::custom)?;
    Ok(secret_key)
}

fn serialize_rsa_secret_key<S>(
    secret_key: &RsaSecretKey,
    serializer: S,
) -> Result<S::Ok, S::Error>
    where S: Serializer,
{
    let secret_key_pem = rsa_secret_key_to_pkcs8_pem(secret_key)
        .map_err(S::Error::custom)?;
    String::serialize(&secret_key_pem, serializer)
}

/// Signing identity carried inside a delivery job
#[derive(Clone, Deserialize, Serialize)]
pub struct Sender {
    #[serde(
        deserialize_with = "deserialize_rsa_secret_key",
        serialize_with = "serialize_rsa_secret_key",
    )]
    pub(crate) rsa_secret_key: RsaSecretKey,
    pub(crate) key_id: String,
}

impl Sender {
    pub fn from_user(instance_url: &str, user: &User) -> Self {
        let actor_id = local_actor_id(instance_url, user.id);
        let key_id = local_actor_key_id(&actor_id);
        Self {
            rsa_secret_key: user.rsa_secret_key.clone(),
            key_id,
        }
    }

    pub fn signer(&self) -> HttpSigner {
        HttpSigner::new_rsa(
            self.rsa_secret_key.clone(),
            self.key_id.clone(),
        )
    }
}

/// Delivery to a single inbox
#[derive(Clone, Deserialize, Serialize)]
pub struct Recipient {
    pub id: String,
    pub inbox: String,
}

impl Recipient {
    /// Prefers the shared inbox when the actor advertises one
    pub fn for_actor(actor: &DbActor) -> Self {
        let inbox = actor.shared_inbox.as_ref()
            .unwrap_or(&actor.inbox)
            .clone();
        Self {
            id: actor.id.clone(),
            inbox,
        }
    }

    /// Delivery to the personal inbox, bypassing the shared one
    pub fn for_personal_inbox(actor: &DbActor) -> Self {
        Self {
            id: actor.id.clone(),
            inbox: actor.inbox.clone(),
        }
    }
}

// Inbox set is de-duplicated, keeping the first-seen order
fn deduplicate_recipients(recipients: Vec<Recipient>) -> Vec<Recipient> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduplicated = vec![];
    for recipient in recipients {
        if seen.insert(recipient.inbox.clone()) {
            deduplicated.push(recipient);
        };
    };
    deduplicated
}

/// Prepared outbound activity with its delivery targets
pub struct OutgoingActivity {
    pub activity: JsonValue,
    pub sender: Sender,
    pub recipients: Vec<Recipient>,
    // Follow request that becomes effective when
    // the activity is delivered
    pub follow_request_id: Option<Uuid>,
}

impl OutgoingActivity {
    pub fn new(
        instance: &Instance,
        sender: &User,
        activity: impl Serialize,
        recipients: Vec<Recipient>,
    ) -> Self {
        let activity = serde_json::to_value(activity)
            .expect("activity should be serializable");
        Self {
            activity,
            sender: Sender::from_user(&instance.url(), sender),
            recipients: deduplicate_recipients(recipients),
            follow_request_id: None,
        }
    }

    pub fn with_follow_request(mut self, follow_request_id: Uuid) -> Self {
        self.follow_request_id = Some(follow_request_id);
        self
    }

    /// Schedules one delivery job per inbox, so one slow peer
    /// doesn't delay the others
    pub async fn enqueue(
        self,
        db_client: &impl DatabaseClient,
    ) -> Result<(), DatabaseError> {
        for recipient in self.recipients {
            let job_data = OutgoingActivityJobData::new(
                self.activity.clone(),
                self.sender.clone(),
                recipient,
                self.follow_request_id,
            );
            job_data.into_job(db_client, 0).await?;
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sorrel_models::profiles::types::DbActor;
    use super::*;

    #[test]
    fn test_sender_serialization_deserialization() {
        use sorrel_utils::crypto_rsa::generate_weak_rsa_key;
        let rsa_secret_key = generate_weak_rsa_key().unwrap();
        let sender = Sender {
            rsa_secret_key: rsa_secret_key.clone(),
            key_id: "https://social.example/api/users/1#main-key".to_string(),
        };
        let value = serde_json::to_value(sender).unwrap();
        let sender: Sender = serde_json::from_value(value).unwrap();
        assert_eq!(sender.rsa_secret_key, rsa_secret_key);
    }

    #[test]
    fn test_recipient_for_actor_shared_inbox() {
        let actor = DbActor {
            id: "https://peer.example/users/1".to_string(),
            inbox: "https://peer.example/users/1/inbox".to_string(),
            outbox: "https://peer.example/users/1/outbox".to_string(),
            shared_inbox: Some("https://peer.example/inbox".to_string()),
            ..Default::default()
        };
        let recipient = Recipient::for_actor(&actor);
        assert_eq!(recipient.inbox, "https://peer.example/inbox");
        let recipient = Recipient::for_personal_inbox(&actor);
        assert_eq!(recipient.inbox, "https://peer.example/users/1/inbox");
    }

    #[test]
    fn test_deduplicate_recipients() {
        let recipient_1 = Recipient {
            id: "https://peer.example/users/1".to_string(),
            inbox: "https://peer.example/inbox".to_string(),
        };
        let recipient_2 = Recipient {
            id: "https://peer.example/users/2".to_string(),
            inbox: "https://peer.example/inbox".to_string(),
        };
        let recipient_3 = Recipient {
            id: "https://other.example/users/3".to_string(),
            inbox: "https://other.example/users/3/inbox".to_string(),
        };
        let recipients = deduplicate_recipients(vec![
            recipient_1,
            recipient_2,
            recipient_3,
        ]);
        assert_eq!(recipients.len(), 2);
        // First-seen order is preserved
        assert_eq!(recipients[0].inbox, "https://peer.example/inbox");
        assert_eq!(recipients[1].inbox, "https://other.example/users/3/inbox");
    }

    #[test]
    fn test_outgoing_activity_deduplicates() {
        let instance = Instance::for_test("https://social.example");
        let sender = User::default();
        let activity = json!({"type": "Create"});
        let actor = DbActor {
            id: "https://peer.example/users/1".to_string(),
            inbox: "https://peer.example/users/1/inbox".to_string(),
            outbox: "https://peer.example/users/1/outbox".to_string(),
            shared_inbox: Some("https://peer.example/inbox".to_string()),
            ..Default::default()
        };
        let other = DbActor {
            id: "https://peer.example/users/2".to_string(),
            inbox: "https://peer.example/users/2/inbox".to_string(),
            outbox: "https://peer.example/users/2/outbox".to_string(),
            shared_inbox: Some("https://peer.example/inbox".to_string()),
            ..Default::default()
        };
        let outgoing_activity = OutgoingActivity::new(
            &instance,
            &sender,
            activity,
            vec![
                Recipient::for_actor(&actor),
                Recipient::for_actor(&other),
            ],
        );
        assert_eq!(outgoing_activity.recipients.len(), 1);
    }
}
