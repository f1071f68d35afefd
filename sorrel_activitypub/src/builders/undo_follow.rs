use serde::Serialize;

use sorrel_config::Instance;
use sorrel_models::profiles::types::DbActor;
use sorrel_models::users::types::User;
use sorrel_utils::id::generate_ulid;

use crate::contexts::{build_default_context, Context};
use crate::deliverer::{OutgoingActivity, Recipient};
use crate::identifiers::{local_activity_id, local_actor_id};
use crate::vocabulary::{FOLLOW, UNDO};

// Peers identify the follow by the embedded activity's
// actor and object, so no activity ID is needed
#[derive(Serialize)]
struct EmbeddedFollow {
    #[serde(rename = "type")]
    activity_type: String,

    actor: String,
    object: String,
}

#[derive(Serialize)]
pub struct UndoFollow {
    #[serde(rename = "@context")]
    _context: Context,

    #[serde(rename = "type")]
    activity_type: String,

    id: String,
    actor: String,
    object: EmbeddedFollow,

    to: Vec<String>,
}

fn build_undo_follow(
    instance_url: &str,
    sender_id: uuid::Uuid,
    target_actor_id: &str,
) -> UndoFollow {
    let activity_id = local_activity_id(instance_url, UNDO, generate_ulid());
    let actor_id = local_actor_id(instance_url, sender_id);
    UndoFollow {
        _context: build_default_context(),
        activity_type: UNDO.to_string(),
        id: activity_id,
        actor: actor_id.clone(),
        object: EmbeddedFollow {
            activity_type: FOLLOW.to_string(),
            actor: actor_id,
            object: target_actor_id.to_string(),
        },
        to: vec![target_actor_id.to_string()],
    }
}

pub fn prepare_undo_follow(
    instance: &Instance,
    sender: &User,
    target_actor: &DbActor,
) -> OutgoingActivity {
    let activity = build_undo_follow(
        &instance.url(),
        sender.id,
        &target_actor.id,
    );
    let recipients = vec![Recipient::for_personal_inbox(target_actor)];
    OutgoingActivity::new(
        instance,
        sender,
        activity,
        recipients,
    )
}

#[cfg(test)]
mod tests {
    use sorrel_utils::id::generate_ulid;
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_build_undo_follow() {
        let sender_id = generate_ulid();
        let target_actor_id = "https://peer.example/users/test";
        let activity = build_undo_follow(
            INSTANCE_URL,
            sender_id,
            target_actor_id,
        );

        assert_eq!(activity.activity_type, "Undo");
        assert_eq!(activity.object.activity_type, "Follow");
        assert_eq!(activity.object.actor, activity.actor);
        assert_eq!(activity.object.object, target_actor_id);
        assert_eq!(activity.to, vec![target_actor_id]);
    }
}
