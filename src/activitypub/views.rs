use actix_web::{
    get,
    post,
    web,
    HttpRequest,
    HttpResponse,
    Scope,
};
use serde::Deserialize;
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use sorrel_activitypub::actors::builders::{
    build_instance_actor,
    build_local_actor,
};
use sorrel_activitypub::authentication::verify_signed_request;
use sorrel_activitypub::builders::announce::build_announce;
use sorrel_activitypub::builders::collection::{
    OrderedCollection,
    OrderedCollectionPage,
};
use sorrel_activitypub::builders::create_note::build_create_note;
use sorrel_activitypub::builders::note::build_note;
use sorrel_activitypub::handlers::activity::handle_activity;
use sorrel_activitypub::identifiers::{
    local_actor_id,
    LocalActorCollection,
};
use sorrel_activitypub::vocabulary::DELETE;
use sorrel_config::Config;
use sorrel_federation::constants::AP_MEDIA_TYPE;
use sorrel_federation::deserialization::object_to_id;
use sorrel_models::database::{
    get_database_client,
    DatabaseClient,
    DatabaseConnectionPool,
    DatabaseError,
};
use sorrel_models::posts::queries::{
    get_post_by_id,
    get_posts_by_author,
};
use sorrel_models::posts::types::Post;
use sorrel_models::profiles::queries::get_remote_profile_by_actor_id;
use sorrel_models::users::queries::get_user_by_id;
use sorrel_utils::http_digest::ContentDigest;

use crate::errors::HttpError;

// Signature verification operates on `http` crate primitives
fn to_http_parts(
    request: &HttpRequest,
) -> Result<(http::Method, http::Uri, http::HeaderMap), HttpError> {
    let method = request.method().as_str().parse::<http::Method>()
        .map_err(|_| HttpError::ValidationError("invalid method".to_string()))?;
    let uri = request.uri().to_string().parse::<http::Uri>()
        .map_err(|_| HttpError::ValidationError("invalid URI".to_string()))?;
    let mut headers = http::HeaderMap::new();
    for (name, value) in request.headers() {
        let name = name.as_str().parse::<http::HeaderName>()
            .map_err(|_| HttpError::ValidationError("invalid header".to_string()))?;
        let value = http::HeaderValue::from_bytes(value.as_bytes())
            .map_err(|_| HttpError::ValidationError("invalid header".to_string()))?;
        headers.append(name, value);
    };
    Ok((method, uri, headers))
}

#[get("")]
async fn actor_view(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let user = get_user_by_id(db_client, *user_id).await?;
    let actor = build_local_actor(&config.instance_url(), &user)
        .map_err(|_| HttpError::InternalError)?;
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(actor);
    Ok(response)
}

#[post("/inbox")]
async fn inbox(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    user_id: web::Path<Uuid>,
    request: HttpRequest,
    request_body: web::Bytes,
) -> Result<HttpResponse, HttpError> {
    if !config.federation.enabled {
        return Err(HttpError::PermissionError);
    };
    let activity: JsonValue = serde_json::from_slice(&request_body)
        .map_err(|_| HttpError::ValidationError("invalid activity".to_string()))?;
    let content_digest = ContentDigest::new(&request_body);
    drop(request_body);

    let activity_type = activity["type"].as_str().unwrap_or("Unknown");
    log::info!("received in {}: {}", request.uri().path(), activity_type);

    let db_client = &mut **get_database_client(&db_pool).await?;
    // The recipient must exist
    let _user = get_user_by_id(db_client, *user_id).await?;

    // Ignore Delete(Person) from actors that were never seen;
    // their servers can not be asked for the signing key anymore
    let maybe_activity_actor = object_to_id(&activity["actor"]).ok();
    let maybe_activity_object = object_to_id(&activity["object"]).ok();
    if activity_type == DELETE &&
        maybe_activity_actor.is_some() &&
        maybe_activity_actor == maybe_activity_object
    {
        let actor_id = maybe_activity_actor
            .expect("actor ID should be present");
        match get_remote_profile_by_actor_id(db_client, &actor_id).await {
            Ok(_) => (),
            Err(DatabaseError::NotFound(_)) => {
                return Ok(HttpResponse::NoContent().finish());
            },
            Err(other_error) => return Err(other_error.into()),
        };
    };

    // Signature covers the digest of the received body;
    // a mutated body is rejected here
    let (method, uri, headers) = to_http_parts(&request)?;
    let signer = verify_signed_request(
        &config,
        db_client,
        &method,
        &uri,
        &headers,
        content_digest,
    ).await.map_err(|error| {
        log::warn!("invalid HTTP signature: {}", error);
        HttpError::from(error)
    })?;

    // The activity must be performed by the owner of the key
    let signer_id = signer.expect_remote_actor_id();
    let activity_actor = object_to_id(&activity["actor"])
        .map_err(|_| {
            HttpError::ValidationError("invalid 'actor' property".to_string())
        })?;
    if activity_actor != signer_id {
        log::warn!(
            "request signer {} does not match actor {}",
            signer_id,
            activity_actor,
        );
        return Err(HttpError::PermissionError);
    };

    handle_activity(&config, db_client, &activity).await
        .map_err(|error| {
            log::warn!(
                "failed to process activity ({}): {}",
                error,
                activity,
            );
            HttpError::from(error)
        })?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
struct CollectionQueryParams {
    page: Option<bool>,
}

async fn build_post_activity(
    db_client: &impl DatabaseClient,
    instance_hostname: &str,
    instance_url: &str,
    post: &Post,
) -> Result<JsonValue, DatabaseError> {
    let activity_value = if post.is_repost() {
        let repost_of_id = post.repost_of_id
            .expect("repost should have a target");
        let target = get_post_by_id(db_client, repost_of_id).await?;
        let activity = build_announce(instance_url, post, &target);
        serde_json::to_value(activity)
            .expect("activity should be serializable")
    } else {
        let maybe_in_reply_to = match post.in_reply_to_id {
            Some(in_reply_to_id) => {
                Some(get_post_by_id(db_client, in_reply_to_id).await?)
            },
            None => None,
        };
        let activity = build_create_note(
            instance_hostname,
            instance_url,
            post,
            maybe_in_reply_to.as_ref(),
        );
        serde_json::to_value(activity)
            .expect("activity should be serializable")
    };
    Ok(activity_value)
}

#[get("/outbox")]
async fn outbox(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    user_id: web::Path<Uuid>,
    query_params: web::Query<CollectionQueryParams>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let user = get_user_by_id(db_client, *user_id).await?;
    let instance = config.instance();
    let actor_id = local_actor_id(&instance.url(), user.id);
    let collection_id = LocalActorCollection::Outbox.of(&actor_id);
    let first_page_id = format!("{}?page=true", collection_id);
    if query_params.page.is_none() {
        let collection = OrderedCollection::new(
            collection_id,
            Some(first_page_id),
            Some(user.profile.post_count),
        );
        let response = HttpResponse::Ok()
            .content_type(AP_MEDIA_TYPE)
            .json(collection);
        return Ok(response);
    };
    // Posts are ordered by creation date; only public ones are shown
    let posts = get_posts_by_author(
        db_client,
        user.id,
        OrderedCollectionPage::DEFAULT_SIZE,
    ).await?;
    let mut activities = vec![];
    for post in posts {
        let activity = build_post_activity(
            db_client,
            &instance.hostname(),
            &instance.url(),
            &post,
        ).await?;
        activities.push(activity);
    };
    let collection_page = OrderedCollectionPage::new(
        first_page_id,
        activities,
    );
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(collection_page);
    Ok(response)
}

#[get("/followers")]
async fn followers_collection(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let user = get_user_by_id(db_client, *user_id).await?;
    let actor_id = local_actor_id(&config.instance_url(), user.id);
    let collection_id = LocalActorCollection::Followers.of(&actor_id);
    // Social graph is not public
    let collection = OrderedCollection::new(
        collection_id,
        None,
        Some(user.profile.follower_count),
    );
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(collection);
    Ok(response)
}

#[get("/following")]
async fn following_collection(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let user = get_user_by_id(db_client, *user_id).await?;
    let actor_id = local_actor_id(&config.instance_url(), user.id);
    let collection_id = LocalActorCollection::Following.of(&actor_id);
    let collection = OrderedCollection::new(
        collection_id,
        None,
        Some(user.profile.following_count),
    );
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(collection);
    Ok(response)
}

pub fn actor_scope() -> Scope {
    web::scope("/api/users/{user_id}")
        .service(actor_view)
        .service(inbox)
        .service(outbox)
        .service(followers_collection)
        .service(following_collection)
}

#[get("/api/posts/{post_id}")]
pub async fn object_view(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let instance = config.instance();
    let post = get_post_by_id(db_client, *post_id).await?;
    if !post.is_local() || !post.is_public() || post.is_repost() {
        return Err(HttpError::NotFoundError("post"));
    };
    if post.deleted_at.is_some() {
        return Err(HttpError::NotFoundError("post"));
    };
    let maybe_in_reply_to = match post.in_reply_to_id {
        Some(in_reply_to_id) => {
            Some(get_post_by_id(db_client, in_reply_to_id).await?)
        },
        None => None,
    };
    let note = build_note(
        &instance.hostname(),
        &instance.url(),
        &post,
        maybe_in_reply_to.as_ref(),
        true,
    );
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(note);
    Ok(response)
}

#[get("/actor")]
pub async fn instance_actor_view(
    config: web::Data<Config>,
) -> Result<HttpResponse, HttpError> {
    let actor = build_instance_actor(&config.instance())
        .map_err(|_| HttpError::InternalError)?;
    let response = HttpResponse::Ok()
        .content_type(AP_MEDIA_TYPE)
        .json(actor);
    Ok(response)
}
