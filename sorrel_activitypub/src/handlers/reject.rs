use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::{
    deserialize_into_object_id,
    object_to_id,
};
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::profiles::queries::get_remote_profile_by_actor_id;
use sorrel_models::relationships::queries::unfollow;
use sorrel_models::users::queries::get_user_by_id;

use crate::errors::ValidationError;
use crate::identifiers::parse_local_actor_id;
use crate::vocabulary::FOLLOW;

use super::accept::get_follow_request_by_activity_ref;
use super::{Descriptor, HandlerResult};

#[derive(Deserialize)]
struct Reject {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    object: JsonValue,
}

pub async fn handle_reject(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    // Reject(Follow): the follow may still be pending,
    // or it may have been accepted earlier
    let reject: Reject = serde_json::from_value(activity)?;
    let actor_profile = get_remote_profile_by_actor_id(
        db_client,
        &reject.actor,
    ).await?;
    let object_id = object_to_id(&reject.object)
        .map_err(|_| ValidationError("invalid 'object' property"))?;
    let follower_id = match get_follow_request_by_activity_ref(
        db_client,
        &config.instance_url(),
        &object_id,
    ).await {
        Ok(follow_request) => {
            if follow_request.target_id != actor_profile.id {
                return Err(ValidationError("actor is not a target").into());
            };
            follow_request.source_id
        },
        Err(DatabaseError::NotFound(_)) => {
            // The request is gone; identify the follower
            // from the embedded Follow activity
            let follower_uri = object_to_id(&reject.object["actor"])
                .map_err(|_| ValidationError("invalid follow activity object"))?;
            let follower_id = parse_local_actor_id(
                &config.instance_url(),
                &follower_uri,
            ).map_err(|_| ValidationError("follower is not a local actor"))?;
            get_user_by_id(db_client, follower_id).await?.id
        },
        Err(other_error) => return Err(other_error.into()),
    };
    // Removes both the relationship and the follow request;
    // returns 404 if neither exists
    unfollow(db_client, follower_id, actor_profile.id).await?;
    Ok(Some(Descriptor::object(FOLLOW)))
}
