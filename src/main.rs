use sorrel_api::init::{initialize_app, prepare_instance_rsa_key};
use sorrel_api::job_queue::scheduler;
use sorrel_api::server::run_server;
use sorrel_models::database::{
    connect::create_pool,
    get_database_client,
    migrate::apply_migrations,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let mut config = initialize_app();

    // https://wiki.postgresql.org/wiki/Number_Of_Database_Connections
    let db_pool_size = config.database_connection_pool_size
        .unwrap_or(num_cpus::get_physical() * 2);
    log::info!("database connection pool size: {db_pool_size}");
    let db_pool = create_pool(
        &config.database_url,
        db_pool_size,
    );
    let mut db_client = get_database_client(&db_pool).await
        .expect("failed to connect to database");
    apply_migrations(&mut db_client).await
        .expect("failed to apply migrations");
    std::mem::drop(db_client);

    let instance_rsa_key = prepare_instance_rsa_key(&config.storage_dir);
    config.set_instance_rsa_key(instance_rsa_key);

    log::info!("instance URL {}", config.instance_url());

    scheduler::start_worker(
        config.clone(),
        db_pool.clone(),
    );
    log::info!("scheduler started");

    run_server(config, db_pool).await
}
