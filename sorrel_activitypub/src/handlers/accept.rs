use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::deserialize_into_object_id;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::profiles::queries::get_remote_profile_by_actor_id;
use sorrel_models::relationships::queries::{
    follow_request_accepted,
    get_follow_request_by_activity_id,
    get_follow_request_by_id,
};
use sorrel_models::relationships::types::{
    DbFollowRequest,
    FollowRequestDirection,
};

use crate::errors::ValidationError;
use crate::identifiers::parse_local_activity_id;
use crate::vocabulary::FOLLOW;

use super::{Descriptor, HandlerResult};

// Locally created Follow activities carry the request ID in their URI
pub(super) async fn get_follow_request_by_activity_ref(
    db_client: &impl DatabaseClient,
    instance_url: &str,
    activity_id: &str,
) -> Result<DbFollowRequest, DatabaseError> {
    match parse_local_activity_id(instance_url, activity_id) {
        Ok(follow_request_id) => {
            get_follow_request_by_id(db_client, follow_request_id).await
        },
        Err(_) => {
            get_follow_request_by_activity_id(db_client, activity_id).await
        },
    }
}

#[derive(Deserialize)]
struct Accept {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

pub async fn handle_accept(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    // Accept(Follow)
    let accept: Accept = serde_json::from_value(activity)?;
    let actor_profile = get_remote_profile_by_actor_id(
        db_client,
        &accept.actor,
    ).await?;
    // Returns 404 if the follow was never requested
    let follow_request = get_follow_request_by_activity_ref(
        db_client,
        &config.instance_url(),
        &accept.object,
    ).await?;
    if follow_request.target_id != actor_profile.id {
        return Err(ValidationError("actor is not a target").into());
    };
    if !matches!(follow_request.direction, FollowRequestDirection::Outgoing) {
        // Only requests sent by local accounts can be accepted remotely
        return Err(ValidationError("unexpected follow request direction").into());
    };
    follow_request_accepted(db_client, follow_request.id).await?;
    Ok(Some(Descriptor::object(FOLLOW)))
}
