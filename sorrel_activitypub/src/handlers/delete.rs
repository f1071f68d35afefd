use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::deserialize_into_object_id;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::delete_post;
use sorrel_models::profiles::queries::{
    delete_profile,
    get_remote_profile_by_actor_id,
};

use crate::errors::ValidationError;
use crate::importers::get_post_by_object_id;

use super::{Descriptor, HandlerResult};

#[derive(Deserialize)]
struct Delete {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,
    published: Option<DateTime<Utc>>,
}

pub async fn handle_delete(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    // Delete(Tombstone), Delete(Note) or Delete(Person)
    let activity: Delete = serde_json::from_value(activity)
        .map_err(|_| ValidationError("unexpected activity structure"))?;
    if activity.object == activity.actor {
        // Self-delete
        let profile = match get_remote_profile_by_actor_id(
            db_client,
            &activity.object,
        ).await {
            Ok(profile) => profile,
            // Ignore Delete(Person) if the profile is not known
            Err(DatabaseError::NotFound(_)) => return Ok(None),
            Err(other_error) => return Err(other_error.into()),
        };
        delete_profile(db_client, profile.id).await?;
        log::info!("deleted remote actor {}", activity.object);
        return Ok(Some(Descriptor::object("Person")));
    };
    // Returns 404 if the post is not found
    let post = get_post_by_object_id(
        db_client,
        &config.instance_url(),
        &activity.object,
    ).await?;
    let actor_profile = get_remote_profile_by_actor_id(
        db_client,
        &activity.actor,
    ).await?;
    if post.author.id != actor_profile.id {
        return Err(ValidationError("actor is not an author").into());
    };
    let deleted_at = activity.published.unwrap_or_else(Utc::now);
    delete_post(db_client, post.id, deleted_at).await?;
    Ok(Some(Descriptor::object("Object")))
}
