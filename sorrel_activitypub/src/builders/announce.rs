use chrono::{DateTime, Utc};
use serde::Serialize;

use sorrel_config::Instance;
use sorrel_federation::constants::AP_PUBLIC;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::get_post_by_id;
use sorrel_models::posts::types::Post;
use sorrel_models::relationships::queries::get_followers;
use sorrel_models::users::types::User;

use crate::contexts::{build_default_context, Context};
use crate::deliverer::{OutgoingActivity, Recipient};
use crate::identifiers::{
    local_activity_id,
    local_actor_followers,
    local_actor_id,
    post_object_id,
    profile_actor_id,
};
use crate::vocabulary::ANNOUNCE;

#[derive(Serialize)]
pub struct Announce {
    #[serde(rename = "@context")]
    _context: Context,

    #[serde(rename = "type")]
    activity_type: String,

    id: String,
    actor: String,
    object: String,

    to: Vec<String>,
    cc: Vec<String>,

    published: DateTime<Utc>,
}

pub fn build_announce(
    instance_url: &str,
    repost: &Post,
    target: &Post,
) -> Announce {
    assert_eq!(Some(target.id), repost.repost_of_id);
    let activity_id = local_activity_id(instance_url, ANNOUNCE, repost.id);
    let actor_id = local_actor_id(instance_url, repost.author.id);
    let target_object_id = post_object_id(instance_url, target);
    let target_author_id = profile_actor_id(instance_url, &target.author);
    Announce {
        _context: build_default_context(),
        activity_type: ANNOUNCE.to_string(),
        id: activity_id,
        actor: actor_id,
        object: target_object_id,
        to: vec![AP_PUBLIC.to_string(), target_author_id],
        cc: vec![local_actor_followers(instance_url, repost.author.id)],
        published: repost.created_at,
    }
}

pub async fn prepare_announce(
    db_client: &impl DatabaseClient,
    instance: &Instance,
    sender: &User,
    repost: &Post,
) -> Result<OutgoingActivity, DatabaseError> {
    assert_eq!(sender.id, repost.author.id);
    let target_id = repost.repost_of_id
        .expect("repost should have a target");
    let target = get_post_by_id(db_client, target_id).await?;
    let activity = build_announce(
        &instance.url(),
        repost,
        &target,
    );
    let mut audience = get_followers(db_client, sender.id).await?;
    audience.push(target.author);
    let recipients = audience.iter()
        .filter_map(|profile| profile.actor_json.as_ref())
        .map(Recipient::for_actor)
        .collect();
    Ok(OutgoingActivity::new(
        instance,
        sender,
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
    fn test_build_announce() {
        let target_author =
            DbActorProfile::remote_for_test("test", "peer.example");
        let target = Post {
            author: target_author,
            object_id: Some("https://peer.example/notes/123".to_string()),
            ..Default::default()
        };
        let reposter = DbActorProfile::local_for_test("reposter");
        let repost = Post {
            author: reposter,
            content: None,
            repost_of_id: Some(target.id),
            ..Default::default()
        };
        let activity = build_announce(INSTANCE_URL, &repost, &target);
        assert_eq!(
            activity.id,
            format!("{}/api/activities/announce/{}", INSTANCE_URL, repost.id),
        );
        assert_eq!(activity.object, "https://peer.example/notes/123");
        assert_eq!(activity.to, vec![
            AP_PUBLIC.to_string(),
            "https://peer.example/users/test".to_string(),
        ]);
    }
}
