use actix_web::{
    middleware::{Logger as ActixLogger, NormalizePath},
    web,
    App,
    HttpResponse,
    HttpServer,
};

use sorrel_config::Config;
use sorrel_models::database::DatabaseConnectionPool;

use crate::activitypub::views as activitypub;
use crate::nodeinfo::views as nodeinfo;
use crate::webfinger::views as webfinger;

pub async fn run_server(
    config: Config,
    db_pool: DatabaseConnectionPool,
) -> std::io::Result<()> {
    let num_workers = std::cmp::max(num_cpus::get(), 4);
    let http_socket_addr = config.http_socket();

    let http_server = HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(ActixLogger::new("%r : %s : %{r}a"))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .service(webfinger::webfinger_view)
            .service(nodeinfo::get_nodeinfo_jrd)
            .service(nodeinfo::get_nodeinfo_2_0)
            .service(nodeinfo::get_nodeinfo_2_1)
            .service(activitypub::actor_scope())
            .service(activitypub::object_view)
            .service(activitypub::instance_actor_view)
            .service(
                // Fallback for well-known paths
                web::resource("/.well-known/{path}")
                    .to(HttpResponse::NotFound)
            )
    });

    log::info!("listening on {}", http_socket_addr);
    http_server
        .bind(http_socket_addr)?
        .workers(num_workers)
        .run()
        .await?;
    log::info!("server terminated");
    Ok(())
}
