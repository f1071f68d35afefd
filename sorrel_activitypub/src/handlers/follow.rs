use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::deserialize_into_object_id;
use sorrel_models::database::DatabaseClient;
use sorrel_models::relationships::queries::create_follow_request;
use sorrel_models::relationships::types::{
    FollowRequestCreateData,
    FollowRequestDirection,
};
use sorrel_models::users::queries::get_user_by_id;

use crate::builders::accept_follow::prepare_accept_follow;
use crate::errors::ValidationError;
use crate::identifiers::parse_local_actor_id;
use crate::importers::{ActorIdResolver, ApClient};
use crate::vocabulary::PERSON;

use super::{Descriptor, HandlerResult};

#[derive(Deserialize)]
struct Follow {
    id: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

pub async fn handle_follow(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    // Follow(Person)
    let activity: Follow = serde_json::from_value(activity)?;
    let ap_client = ApClient::new(config);
    let source_profile = ActorIdResolver::default().only_remote().resolve(
        &ap_client,
        db_client,
        &activity.actor,
    ).await?;
    let source_actor = source_profile.expect_actor_data().clone();
    // The target must be a local account
    let target_id = parse_local_actor_id(
        &config.instance_url(),
        &activity.object,
    ).map_err(|_| ValidationError("object is not a local actor"))?;
    let target_user = get_user_by_id(db_client, target_id).await?;
    // Create a follow request, or refresh the activity ID of an
    // existing one (the latest ID may be needed to process Undo)
    let follow_request = create_follow_request(
        db_client,
        FollowRequestCreateData {
            source_id: source_profile.id,
            target_id: target_user.id,
            activity_id: Some(activity.id.clone()),
            direction: FollowRequestDirection::Incoming,
        },
    ).await?;
    // Followers are currently auto-accepted. The relationship becomes
    // effective when the Accept activity reaches the follower's server.
    prepare_accept_follow(
        &config.instance(),
        &target_user,
        &source_actor,
        &activity.id,
        follow_request.id,
    ).enqueue(db_client).await?;
    Ok(Some(Descriptor::object(PERSON)))
}
