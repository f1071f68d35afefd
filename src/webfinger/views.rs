/// https://webfinger.net/
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use sorrel_activitypub::identifiers::{
    local_actor_id,
    local_instance_actor_id,
    parse_local_actor_id,
};
use sorrel_config::{Config, Instance};
use sorrel_federation::addresses::ActorAddress;
use sorrel_federation::jrd::{
    JsonResourceDescriptor,
    Link,
    JRD_MEDIA_TYPE,
};
use sorrel_models::database::{
    get_database_client,
    DatabaseClient,
    DatabaseConnectionPool,
};
use sorrel_models::users::queries::{get_user_by_id, get_user_by_name};

use crate::errors::HttpError;

#[derive(Deserialize)]
pub struct WebfingerQueryParams {
    pub resource: String,
}

async fn get_jrd(
    db_client: &impl DatabaseClient,
    instance: Instance,
    resource: &str,
) -> Result<JsonResourceDescriptor, HttpError> {
    let instance_actor_id = local_instance_actor_id(&instance.url());
    let actor_address = if resource.starts_with("acct:") {
        ActorAddress::from_acct_uri(resource)
            .map_err(|error| HttpError::ValidationError(error.to_string()))?
    } else if resource == instance_actor_id {
        // Reverse webfinger for the instance actor
        let jrd = JsonResourceDescriptor {
            subject: resource.to_string(),
            aliases: vec![],
            links: vec![Link::actor(&instance_actor_id)],
        };
        return Ok(jrd);
    } else {
        // Actor ID? (reverse webfinger)
        let profile_id = parse_local_actor_id(&instance.url(), resource)?;
        let user = get_user_by_id(db_client, profile_id).await?;
        ActorAddress::new_unchecked(
            &user.profile.username,
            &instance.hostname(),
        )
    };
    if actor_address.hostname() != instance.hostname() {
        // Wrong instance
        return Err(HttpError::NotFoundError("user"));
    };
    let user = get_user_by_name(db_client, actor_address.username()).await?;
    let actor_id = local_actor_id(&instance.url(), user.id);
    // Required by GNU Social
    let link_profile = Link {
        rel: "http://webfinger.net/rel/profile-page".to_string(),
        media_type: Some("text/html".to_string()),
        href: Some(actor_id.clone()),
    };
    let link_actor = Link::actor(&actor_id);
    let jrd = JsonResourceDescriptor {
        subject: actor_address.to_acct_uri(),
        aliases: vec![actor_id],
        links: vec![link_profile, link_actor],
    };
    Ok(jrd)
}

#[get("/.well-known/webfinger")]
pub async fn webfinger_view(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
    query_params: web::Query<WebfingerQueryParams>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let jrd = get_jrd(
        db_client,
        config.instance(),
        &query_params.resource,
    ).await?;
    let response = HttpResponse::Ok()
        .content_type(JRD_MEDIA_TYPE)
        .json(jrd);
    Ok(response)
}
