use chrono::{DateTime, Utc};
use postgres_types::FromSql;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{
    json_macro::{json_from_sql, json_to_sql},
    DatabaseTypeError,
};

/// Remote actor data, stored as fetched from its origin
#[derive(Clone, Debug, Deserialize, Serialize)]
#[cfg_attr(any(test, feature = "test-utils"), derive(Default))]
pub struct DbActor {
    pub id: String,
    pub inbox: String,
    pub outbox: String,
    pub followers: Option<String>,
    pub shared_inbox: Option<String>,
    pub url: Option<String>,
}

json_from_sql!(DbActor);
json_to_sql!(DbActor);

/// Public key of an actor, upserted by key ID
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DbActorKey {
    pub id: String,
    pub public_key_pem: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DbPublicKeys(pub Vec<DbActorKey>);

impl DbPublicKeys {
    pub fn inner(&self) -> &[DbActorKey] {
        let Self(keys) = self;
        keys
    }

    pub fn find_by_key_id(&self, key_id: &str) -> Option<&DbActorKey> {
        self.inner().iter().find(|key| key.id == key_id)
    }
}

json_from_sql!(DbPublicKeys);
json_to_sql!(DbPublicKeys);

#[derive(Clone, FromSql)]
#[postgres(name = "actor_profile")]
pub struct DbActorProfile {
    pub id: Uuid,
    pub username: String,
    pub hostname: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub public_keys: DbPublicKeys,
    pub actor_json: Option<DbActor>,
    pub actor_id: Option<String>,
    pub follower_count: i32,
    pub following_count: i32,
    pub post_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub unreachable_since: Option<DateTime<Utc>>,
}

// Profile is local iff hostname is empty.
// Local profiles must not have actor data,
// remote profiles must have canonical actor ID.
impl DbActorProfile {
    pub fn check_consistency(&self) -> Result<(), DatabaseTypeError> {
        if self.hostname.is_none() != self.actor_json.is_none() {
            return Err(DatabaseTypeError);
        };
        if let Some(ref actor) = self.actor_json {
            if self.actor_id.as_ref() != Some(&actor.id) {
                return Err(DatabaseTypeError);
            };
        };
        Ok(())
    }

    pub fn is_local(&self) -> bool {
        self.hostname.is_none()
    }

    pub fn expect_actor_data(&self) -> &DbActor {
        self.actor_json.as_ref()
            .expect("actor data should be present on remote profile")
    }

    pub fn expect_remote_actor_id(&self) -> &str {
        self.actor_id.as_deref()
            .expect("actor ID should be present on remote profile")
    }

    /// Returns webfinger-style address (username or username@hostname)
    pub fn acct(&self, local_hostname: &str) -> String {
        match self.hostname {
            Some(ref hostname) => format!("{}@{}", self.username, hostname),
            None => format!("{}@{}", self.username, local_hostname),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for DbActorProfile {
    fn default() -> Self {
        Self {
            id: sorrel_utils::id::generate_ulid(),
            username: "".to_string(),
            hostname: None,
            display_name: None,
            bio: None,
            public_keys: DbPublicKeys::default(),
            actor_json: None,
            actor_id: None,
            follower_count: 0,
            following_count: 0,
            post_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            unreachable_since: None,
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl DbActorProfile {
    pub fn local_for_test(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Default::default()
        }
    }

    pub fn remote_for_test(username: &str, hostname: &str) -> Self {
        let actor_id = format!("https://{}/users/{}", hostname, username);
        Self {
            username: username.to_string(),
            hostname: Some(hostname.to_string()),
            actor_json: Some(DbActor {
                id: actor_id.clone(),
                inbox: format!("{}/inbox", actor_id),
                outbox: format!("{}/outbox", actor_id),
                ..Default::default()
            }),
            actor_id: Some(actor_id),
            ..Default::default()
        }
    }
}

pub struct ProfileCreateData {
    pub username: String,
    pub hostname: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub public_keys: Vec<DbActorKey>,
    pub actor_json: Option<DbActor>,
}

pub struct ProfileUpdateData {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub public_keys: Vec<DbActorKey>,
    pub actor_json: Option<DbActor>,
}
