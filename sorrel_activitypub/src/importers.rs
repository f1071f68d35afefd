use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue};

use sorrel_config::{Config, Instance};
use sorrel_federation::{
    addresses::ActorAddress,
    agent::FederationAgent,
    fetch::{fetch_json, fetch_object, FetchError},
    jrd::{JsonResourceDescriptor, JRD_MEDIA_TYPE},
};
use sorrel_models::{
    database::{DatabaseClient, DatabaseError},
    posts::queries::{get_post_by_id, get_remote_post_by_object_id},
    posts::types::Post,
    profiles::queries::{
        get_profile_by_acct,
        get_profile_by_id,
        get_remote_profile_by_actor_id,
    },
    profiles::types::DbActorProfile,
    users::types::User,
};

use crate::actors::handlers::{create_remote_profile, update_remote_profile};
use crate::actors::types::Actor;
use crate::agent::build_federation_agent;
use crate::errors::{HandlerError, ValidationError};
use crate::handlers::note::{create_remote_post, AttributedObject};
use crate::identifiers::{parse_local_actor_id, parse_local_object_id};

// Maximum length of a reply chain that is fetched at once
const IMPORT_DEPTH_LIMIT: usize = 5;

pub struct ApClient {
    pub instance: Instance,
    pub as_user: Option<User>,
}

impl ApClient {
    pub fn new(config: &Config) -> Self {
        Self {
            instance: config.instance(),
            as_user: None,
        }
    }

    pub fn agent(&self) -> FederationAgent {
        build_federation_agent(&self.instance, self.as_user.as_ref())
    }

    pub async fn fetch_object<T: DeserializeOwned>(
        &self,
        object_id: &str,
    ) -> Result<T, HandlerError> {
        let object_json = fetch_object(&self.agent(), object_id).await?;
        let object_id = object_json["id"].as_str()
            .ok_or(ValidationError("missing 'id' property"))?;
        if is_local_origin(&self.instance, object_id) {
            return Err(HandlerError::LocalObject);
        };
        let object: T = serde_json::from_value(object_json)?;
        Ok(object)
    }
}

pub fn is_local_origin(instance: &Instance, object_id: &str) -> bool {
    object_id.starts_with(&instance.url())
}

pub async fn get_post_by_object_id(
    db_client: &impl DatabaseClient,
    instance_url: &str,
    object_id: &str,
) -> Result<Post, DatabaseError> {
    match parse_local_object_id(instance_url, object_id) {
        Ok(post_id) => {
            // Local post
            get_post_by_id(db_client, post_id).await
        },
        Err(_) => {
            // Remote post
            get_remote_post_by_object_id(db_client, object_id).await
        },
    }
}

// Actor must be authenticated (fetched from its origin)
pub async fn import_profile(
    ap_client: &ApClient,
    db_client: &impl DatabaseClient,
    actor_json: JsonValue,
) -> Result<DbActorProfile, HandlerError> {
    let actor: Actor = serde_json::from_value(actor_json)?;
    if is_local_origin(&ap_client.instance, &actor.id) {
        return Err(HandlerError::LocalObject);
    };
    let profile = match get_remote_profile_by_actor_id(
        db_client,
        &actor.id,
    ).await {
        Ok(profile) => {
            log::info!("re-fetched actor {}", actor.id);
            update_remote_profile(db_client, profile, actor).await?
        },
        Err(DatabaseError::NotFound(_)) => {
            log::info!("fetched actor {}", actor.id);
            create_remote_profile(db_client, actor).await?
        },
        Err(other_error) => return Err(other_error.into()),
    };
    Ok(profile)
}

async fn refresh_remote_profile(
    ap_client: &ApClient,
    db_client: &impl DatabaseClient,
    profile: DbActorProfile,
    force: bool,
) -> Result<DbActorProfile, HandlerError> {
    let remote_actor_ttl =
        Duration::seconds(ap_client.instance.federation.remote_actor_ttl as i64);
    let profile = if force ||
        profile.updated_at < Utc::now() - remote_actor_ttl
    {
        // Try to re-fetch actor data
        let actor_id = profile.expect_remote_actor_id().to_string();
        match ap_client.fetch_object::<Actor>(&actor_id).await {
            Ok(actor) => {
                if actor.id != actor_id {
                    log::warn!("ignoring actor ID change: {}", actor_id);
                    return Ok(profile);
                };
                log::info!("re-fetched actor {}", actor_id);
                update_remote_profile(db_client, profile, actor).await?
            },
            Err(error) => {
                // Ignore error and return stored profile
                log::warn!(
                    "failed to re-fetch {} ({})",
                    actor_id,
                    error,
                );
                profile
            },
        }
    } else {
        // Refresh is not needed
        profile
    };
    Ok(profile)
}

#[derive(Default)]
pub struct ActorIdResolver {
    only_remote: bool,
    force_refetch: bool,
}

impl ActorIdResolver {
    pub fn only_remote(mut self) -> Self {
        self.only_remote = true;
        self
    }

    pub fn force_refetch(mut self) -> Self {
        self.force_refetch = true;
        self
    }

    // Possible errors:
    // - LocalObject: local URL passed to only_remote resolver
    // - FetchError: fetcher errors
    // - ValidationError: invalid actor document
    // - DatabaseError(DatabaseError::NotFound(_)): local actor not found
    // - DatabaseError: other database errors
    pub async fn resolve(
        &self,
        ap_client: &ApClient,
        db_client: &impl DatabaseClient,
        actor_id: &str,
    ) -> Result<DbActorProfile, HandlerError> {
        if is_local_origin(&ap_client.instance, actor_id) {
            if self.only_remote {
                return Err(HandlerError::LocalObject);
            };
            let profile_id =
                parse_local_actor_id(&ap_client.instance.url(), actor_id)?;
            let profile = get_profile_by_id(db_client, profile_id).await?;
            return Ok(profile);
        };
        // Remote actor
        let profile = match get_remote_profile_by_actor_id(
            db_client,
            actor_id,
        ).await {
            Ok(profile) => {
                refresh_remote_profile(
                    ap_client,
                    db_client,
                    profile,
                    self.force_refetch,
                ).await?
            },
            Err(DatabaseError::NotFound(_)) => {
                let actor: JsonValue = ap_client.fetch_object(actor_id).await?;
                import_profile(ap_client, db_client, actor).await?
            },
            Err(other_error) => return Err(other_error.into()),
        };
        Ok(profile)
    }
}

/// Performs webfinger query and imports the actor
pub async fn import_profile_by_acct(
    ap_client: &ApClient,
    db_client: &impl DatabaseClient,
    actor_address: &ActorAddress,
) -> Result<DbActorProfile, HandlerError> {
    if actor_address.hostname() == ap_client.instance.hostname() {
        return Err(HandlerError::LocalObject);
    };
    match get_profile_by_acct(
        db_client,
        actor_address.username(),
        Some(actor_address.hostname()),
    ).await {
        Ok(profile) => {
            let profile = refresh_remote_profile(
                ap_client,
                db_client,
                profile,
                false,
            ).await?;
            return Ok(profile);
        },
        Err(DatabaseError::NotFound(_)) => (),
        Err(other_error) => return Err(other_error.into()),
    };
    let webfinger_url = format!(
        "https://{}/.well-known/webfinger",
        actor_address.hostname(),
    );
    let webfinger_resource = actor_address.to_acct_uri();
    let jrd_value = fetch_json(
        &ap_client.agent(),
        &webfinger_url,
        &[("resource", webfinger_resource.as_str())],
        Some(JRD_MEDIA_TYPE),
    ).await?;
    let jrd: JsonResourceDescriptor = serde_json::from_value(jrd_value)?;
    let actor_id = jrd.find_actor_id()
        .ok_or(ValidationError("actor link not found"))?;
    let profile = ActorIdResolver::default().only_remote().resolve(
        ap_client,
        db_client,
        &actor_id,
    ).await?;
    Ok(profile)
}

/// Fetches the object and its reply-to ancestors,
/// then stores them as posts (ancestors first)
pub async fn import_post(
    ap_client: &ApClient,
    db_client: &mut impl DatabaseClient,
    object_id: String,
    maybe_object_received: Option<AttributedObject>,
) -> Result<Post, HandlerError> {
    let instance_url = ap_client.instance.url();
    let mut maybe_received = maybe_object_received;
    let mut objects: Vec<AttributedObject> = vec![];
    let mut maybe_next_id = Some(object_id.clone());

    // Fetch ancestors by going through the inReplyTo references
    while let Some(current_id) = maybe_next_id.take() {
        if parse_local_object_id(&instance_url, &current_id).is_ok() {
            if objects.is_empty() {
                return Err(HandlerError::LocalObject);
            };
            // Parent of the last fetched object is a local post
            break;
        };
        match get_remote_post_by_object_id(db_client, &current_id).await {
            Ok(_) => {
                if objects.is_empty() {
                    // Requested object is already known
                    return get_remote_post_by_object_id(db_client, &object_id)
                        .await.map_err(Into::into);
                };
                // Parent of the last fetched object is already known
                break;
            },
            Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error.into()),
        };
        if objects.len() >= IMPORT_DEPTH_LIMIT {
            return Err(HandlerError::FetchError(FetchError::RecursionError));
        };
        let object: AttributedObject = match maybe_received.take() {
            Some(object) => {
                if object.id != current_id {
                    return Err(ValidationError("object ID mismatch").into());
                };
                object
            },
            None => ap_client.fetch_object(&current_id).await?,
        };
        log::info!("fetched object {}", object.id);
        maybe_next_id = object.in_reply_to.clone();
        objects.push(object);
    };

    // Create posts, starting with the root of the thread
    for object in objects.into_iter().rev() {
        create_remote_post(ap_client, db_client, object).await?;
    };
    let post = get_remote_post_by_object_id(db_client, &object_id).await?;
    Ok(post)
}
