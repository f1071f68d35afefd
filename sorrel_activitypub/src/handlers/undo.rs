use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::{
    deserialize_into_object_id,
    object_to_id,
};
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::{
    delete_post,
    get_remote_post_by_object_id,
};
use sorrel_models::profiles::queries::get_remote_profile_by_actor_id;
use sorrel_models::relationships::queries::unfollow;
use sorrel_models::users::queries::get_user_by_id;

use crate::errors::ValidationError;
use crate::identifiers::parse_local_actor_id;
use crate::vocabulary::{ANNOUNCE, FOLLOW};

use super::{Descriptor, HandlerResult};

#[derive(Deserialize)]
struct UndoFollow {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    object: JsonValue,
}

/// Special handler for Undo with embedded Follow
async fn handle_undo_follow(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    let undo: UndoFollow = serde_json::from_value(activity)?;
    // Third parties can't revoke the follow
    let follow_actor_id = object_to_id(&undo.object["actor"])
        .map_err(|_| ValidationError("invalid follow activity object"))?;
    if follow_actor_id != undo.actor {
        return Err(ValidationError("actor is not a follower").into());
    };
    let source_profile = get_remote_profile_by_actor_id(
        db_client,
        &undo.actor,
    ).await?;
    let target_actor_id = object_to_id(&undo.object["object"])
        .map_err(|_| ValidationError("invalid follow activity object"))?;
    let target_id = parse_local_actor_id(
        &config.instance_url(),
        &target_actor_id,
    ).map_err(|_| ValidationError("object is not a local actor"))?;
    let target_user = get_user_by_id(db_client, target_id).await?;
    match unfollow(db_client, source_profile.id, target_user.id).await {
        Ok(_) => (),
        // Ignore Undo if the relationship doesn't exist
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(other_error) => return Err(other_error.into()),
    };
    Ok(Some(Descriptor::object(FOLLOW)))
}

#[derive(Deserialize)]
struct Undo {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
}

pub async fn handle_undo(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    if activity["object"]["type"].as_str() == Some(FOLLOW) {
        // Undo() with nested follow activity
        return handle_undo_follow(config, db_client, activity).await;
    };
    // Undo(Announce)
    let undo: Undo = serde_json::from_value(activity)?;
    let actor_profile = get_remote_profile_by_actor_id(
        db_client,
        &undo.actor,
    ).await?;
    let repost = match get_remote_post_by_object_id(
        db_client,
        &undo.object,
    ).await {
        Ok(repost) => repost,
        // Ignore undo if repost is not found
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(other_error) => return Err(other_error.into()),
    };
    if repost.author.id != actor_profile.id {
        return Err(ValidationError("actor is not an author").into());
    };
    if !repost.is_repost() {
        return Err(ValidationError("object is not a repost").into());
    };
    delete_post(db_client, repost.id, chrono::Utc::now()).await?;
    Ok(Some(Descriptor::object(ANNOUNCE)))
}
