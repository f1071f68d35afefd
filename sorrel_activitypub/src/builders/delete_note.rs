use chrono::{DateTime, Utc};
use serde::Serialize;

use sorrel_config::Instance;
use sorrel_federation::constants::AP_PUBLIC;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::types::Post;
use sorrel_models::relationships::queries::get_followers;
use sorrel_models::users::types::User;
use sorrel_utils::id::generate_ulid;

use crate::contexts::{build_default_context, Context};
use crate::deliverer::{OutgoingActivity, Recipient};
use crate::identifiers::{
    local_activity_id,
    local_actor_followers,
    local_actor_id,
    local_object_id,
};
use crate::vocabulary::{DELETE, TOMBSTONE};

#[derive(Serialize)]
struct Tombstone {
    id: String,

    #[serde(rename = "type")]
    object_type: String,
}

#[derive(Serialize)]
pub struct DeleteNote {
    #[serde(rename = "@context")]
    _context: Context,

    #[serde(rename = "type")]
    activity_type: String,

    id: String,
    actor: String,
    object: Tombstone,

    to: Vec<String>,
    cc: Vec<String>,

    published: DateTime<Utc>,
}

fn build_delete_note(
    instance_url: &str,
    post: &Post,
) -> DeleteNote {
    let object_id = local_object_id(instance_url, post.id);
    let activity_id = local_activity_id(instance_url, DELETE, generate_ulid());
    let actor_id = local_actor_id(instance_url, post.author.id);
    DeleteNote {
        _context: build_default_context(),
        activity_type: DELETE.to_string(),
        id: activity_id,
        actor: actor_id,
        object: Tombstone {
            id: object_id,
            object_type: TOMBSTONE.to_string(),
        },
        to: vec![AP_PUBLIC.to_string()],
        cc: vec![local_actor_followers(instance_url, post.author.id)],
        published: Utc::now(),
    }
}

pub async fn prepare_delete_note(
    db_client: &impl DatabaseClient,
    instance: &Instance,
    author: &User,
    post: &Post,
) -> Result<OutgoingActivity, DatabaseError> {
    assert_eq!(author.id, post.author.id);
    let activity = build_delete_note(&instance.url(), post);
    let mut audience = get_followers(db_client, author.id).await?;
    audience.extend(post.mentions.clone());
    let recipients = audience.iter()
        .filter_map(|profile| profile.actor_json.as_ref())
        .map(Recipient::for_actor)
        .collect();
    Ok(OutgoingActivity::new(
        instance,
        author,
        activity,
        recipients,
    ))
}

#[cfg(test)]
mod tests {
    use sorrel_models::profiles::types::DbActorProfile;
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_build_delete_note() {
        let author = DbActorProfile::local_for_test("author");
        let post = Post {
            author,
            content: Some("test".to_string()),
            ..Default::default()
        };
        let activity = build_delete_note(INSTANCE_URL, &post);
        assert_eq!(activity.activity_type, "Delete");
        assert_eq!(
            activity.object.id,
            format!("{}/api/posts/{}", INSTANCE_URL, post.id),
        );
        assert_eq!(activity.object.object_type, "Tombstone");
        assert_eq!(activity.to, vec![AP_PUBLIC]);
    }
}
