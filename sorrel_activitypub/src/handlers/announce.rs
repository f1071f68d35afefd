use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::{
    deserialize_into_id_array,
    deserialize_into_object_id,
};
use sorrel_federation::utils::is_public;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::{
    create_post,
    get_post_by_id,
    get_remote_post_by_object_id,
};
use sorrel_models::posts::types::{PostCreateData, Visibility};

use crate::errors::ValidationError;
use crate::identifiers::parse_local_object_id;
use crate::importers::{import_post, ActorIdResolver, ApClient};

use super::{Descriptor, HandlerResult};

#[derive(Deserialize)]
struct Announce {
    id: String,
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,

    #[serde(deserialize_with = "deserialize_into_object_id")]
    object: String,

    #[serde(default, deserialize_with = "deserialize_into_id_array")]
    to: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_into_id_array")]
    cc: Vec<String>,
}

fn get_repost_visibility(audience: &[String]) -> Visibility {
    if audience.iter().any(is_public) {
        Visibility::Public
    } else {
        log::warn!("repost is not public");
        Visibility::Followers
    }
}

pub async fn handle_announce(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    // Announce(Note)
    let announce: Announce = serde_json::from_value(activity)?;
    match get_remote_post_by_object_id(
        db_client,
        &announce.id,
    ).await {
        Ok(_) => return Ok(None), // Ignore if repost already exists
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };
    let ap_client = ApClient::new(config);
    let author = ActorIdResolver::default().only_remote().resolve(
        &ap_client,
        db_client,
        &announce.actor,
    ).await?;
    let post = match parse_local_object_id(
        &ap_client.instance.url(),
        &announce.object,
    ) {
        Ok(post_id) => get_post_by_id(db_client, post_id).await?,
        Err(_) => {
            // Try to get remote post
            import_post(&ap_client, db_client, announce.object, None).await?
        },
    };
    if post.deleted_at.is_some() {
        return Err(DatabaseError::NotFound("post").into());
    };
    if !post.is_public() {
        return Err(ValidationError("repost of a non-public post").into());
    };
    let visibility = get_repost_visibility(
        &[announce.to.clone(), announce.cc.clone()].concat(),
    );
    let repost_data = PostCreateData::repost(
        post.id,
        visibility,
        Some(announce.id.clone()),
    );
    match create_post(db_client, author.id, repost_data).await {
        Ok(_) => Ok(Some(Descriptor::object("Object"))),
        Err(DatabaseError::AlreadyExists("post")) => {
            // Ignore activity if repost already exists (with a different
            // activity ID, or due to race condition in a handler)
            log::warn!("repost already exists: {}", announce.id);
            Ok(None)
        },
        Err(other_error) => Err(other_error.into()),
    }
}
