use actix_web::{get, web, HttpResponse};
use serde_json::json;

use sorrel_config::Config;
use sorrel_models::database::{
    get_database_client,
    DatabaseClient,
    DatabaseConnectionPool,
};
use sorrel_models::posts::queries::get_post_count;
use sorrel_models::users::queries::get_user_count;

use crate::errors::HttpError;

use super::types::{NodeInfo, Usage, Users};

async fn get_usage(
    db_client: &impl DatabaseClient,
) -> Result<Usage, HttpError> {
    let user_count = get_user_count(db_client).await?;
    let post_count = get_post_count(db_client, true).await?;
    let usage = Usage {
        users: Users { total: user_count },
        local_posts: post_count,
    };
    Ok(usage)
}

#[get("/.well-known/nodeinfo")]
pub async fn get_nodeinfo_jrd(
    config: web::Data<Config>,
) -> Result<HttpResponse, HttpError> {
    let instance_url = config.instance_url();
    let jrd = json!({
        "links": [
            {
                "rel": "http://nodeinfo.diaspora.software/ns/schema/2.0",
                "href": format!("{}/nodeinfo/2.0", instance_url),
            },
            {
                "rel": "http://nodeinfo.diaspora.software/ns/schema/2.1",
                "href": format!("{}/nodeinfo/2.1", instance_url),
            },
        ],
    });
    let response = HttpResponse::Ok().json(jrd);
    Ok(response)
}

#[get("/nodeinfo/2.0")]
pub async fn get_nodeinfo_2_0(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let usage = get_usage(db_client).await?;
    let nodeinfo = NodeInfo::new_20(&config, usage);
    let response = HttpResponse::Ok().json(nodeinfo);
    Ok(response)
}

#[get("/nodeinfo/2.1")]
pub async fn get_nodeinfo_2_1(
    config: web::Data<Config>,
    db_pool: web::Data<DatabaseConnectionPool>,
) -> Result<HttpResponse, HttpError> {
    let db_client = &**get_database_client(&db_pool).await?;
    let usage = get_usage(db_client).await?;
    let nodeinfo = NodeInfo::new_21(&config, usage);
    let response = HttpResponse::Ok().json(nodeinfo);
    Ok(response)
}
