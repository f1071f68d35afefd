use serde::Serialize;
use uuid::Uuid;

use sorrel_config::Instance;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::profiles::types::{DbActor, DbActorProfile};
use sorrel_models::relationships::queries::{
    create_follow_request,
    follow,
    is_following,
};
use sorrel_models::relationships::types::{
    FollowRequestCreateData,
    FollowRequestDirection,
};
use sorrel_models::users::types::User;

use crate::contexts::{build_default_context, Context};
use crate::deliverer::{OutgoingActivity, Recipient};
use crate::identifiers::{local_activity_id, local_actor_id};
use crate::vocabulary::FOLLOW;

#[derive(Serialize)]
pub(super) struct Follow {
    #[serde(rename = "@context")]
    pub _context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
}

pub(super) fn build_follow(
    instance_url: &str,
    sender_id: Uuid,
    target_actor_id: &str,
    follow_request_id: Uuid,
) -> Follow {
    let activity_id = local_activity_id(instance_url, FOLLOW, follow_request_id);
    let actor_id = local_actor_id(instance_url, sender_id);
    Follow {
        _context: build_default_context(),
        activity_type: FOLLOW.to_string(),
        id: activity_id,
        actor: actor_id,
        object: target_actor_id.to_string(),
        to: vec![target_actor_id.to_string()],
    }
}

fn prepare_follow(
    instance: &Instance,
    sender: &User,
    target_actor: &DbActor,
    follow_request_id: Uuid,
) -> OutgoingActivity {
    let activity = build_follow(
        &instance.url(),
        sender.id,
        &target_actor.id,
        follow_request_id,
    );
    let recipients = vec![Recipient::for_personal_inbox(target_actor)];
    OutgoingActivity::new(
        instance,
        sender,
        activity,
        recipients,
    )
}

/// Follows a local account directly, or sends a follow
/// request to a remote one
pub async fn follow_or_create_request(
    db_client: &mut impl DatabaseClient,
    instance: &Instance,
    current_user: &User,
    target_profile: &DbActorProfile,
) -> Result<(), DatabaseError> {
    if is_following(db_client, current_user.id, target_profile.id).await? {
        // Already following
        return Ok(());
    };
    match target_profile.actor_json {
        Some(ref remote_actor) => {
            let follow_request = create_follow_request(
                db_client,
                FollowRequestCreateData {
                    source_id: current_user.id,
                    target_id: target_profile.id,
                    activity_id: None,
                    direction: FollowRequestDirection::Outgoing,
                },
            ).await?;
            prepare_follow(
                instance,
                current_user,
                remote_actor,
                follow_request.id,
            ).enqueue(db_client).await?;
        },
        None => {
            // Local follows become effective immediately
            match follow(db_client, current_user.id, target_profile.id).await {
                Ok(_) | Err(DatabaseError::AlreadyExists(_)) => (),
                Err(other_error) => return Err(other_error),
            };
        },
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use sorrel_utils::id::generate_ulid;
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_build_follow() {
        let follower_id = generate_ulid();
        let follow_request_id = generate_ulid();
        let target_actor_id = "https://peer.example/users/test";
        let activity = build_follow(
            INSTANCE_URL,
            follower_id,
            target_actor_id,
            follow_request_id,
        );

        assert_eq!(
            activity.id,
            format!("{}/api/activities/follow/{}", INSTANCE_URL, follow_request_id),
        );
        assert_eq!(activity.activity_type, "Follow");
        assert_eq!(
            activity.actor,
            format!("{}/api/users/{}", INSTANCE_URL, follower_id),
        );
        assert_eq!(activity.object, target_actor_id);
        assert_eq!(activity.to, vec![target_actor_id]);
    }
}
