use serde::Serialize;
use uuid::Uuid;

use sorrel_config::Instance;
use sorrel_models::profiles::types::DbActor;
use sorrel_models::users::types::User;
use sorrel_utils::id::generate_ulid;

use crate::contexts::{build_default_context, Context};
use crate::deliverer::{OutgoingActivity, Recipient};
use crate::identifiers::{local_activity_id, local_actor_id};
use crate::vocabulary::ACCEPT;

#[derive(Serialize)]
pub struct AcceptFollow {
    #[serde(rename = "@context")]
    pub _context: Context,

    #[serde(rename = "type")]
    pub activity_type: String,

    pub id: String,
    pub actor: String,
    pub object: String,

    pub to: Vec<String>,
}

fn build_accept_follow(
    instance_url: &str,
    actor_profile_id: Uuid,
    source_actor_id: &str,
    follow_activity_id: &str,
) -> AcceptFollow {
    // Accept(Follow) is idempotent so its ID can be random
    let activity_id = local_activity_id(instance_url, ACCEPT, generate_ulid());
    let actor_id = local_actor_id(instance_url, actor_profile_id);
    AcceptFollow {
        _context: build_default_context(),
        activity_type: ACCEPT.to_string(),
        id: activity_id,
        actor: actor_id,
        object: follow_activity_id.to_string(),
        to: vec![source_actor_id.to_string()],
    }
}

pub fn prepare_accept_follow(
    instance: &Instance,
    sender: &User,
    source_actor: &DbActor,
    follow_activity_id: &str,
    follow_request_id: Uuid,
) -> OutgoingActivity {
    let activity = build_accept_follow(
        &instance.url(),
        sender.id,
        &source_actor.id,
        follow_activity_id,
    );
    // The accept is delivered to the personal inbox of the requester
    let recipients = vec![Recipient::for_personal_inbox(source_actor)];
    OutgoingActivity::new(
        instance,
        sender,
        activity,
        recipients,
    ).with_follow_request(follow_request_id)
}
