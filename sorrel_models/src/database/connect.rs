use deadpool_postgres::Pool;
use tokio_postgres::config::{Config as DatabaseConfig};

pub async fn create_database_client(
    db_config: &DatabaseConfig,
) -> Result<tokio_postgres::Client, tokio_postgres::Error> {
    let (client, connection) = db_config.connect(tokio_postgres::NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::error!("connection error: {}", err);
        };
    });
    Ok(client)
}

pub fn create_pool(
    database_url: &str,
    pool_size: usize,
) -> Pool {
    let database_config = database_url.parse()
        .expect("invalid database URL");
    let manager = deadpool_postgres::Manager::new(
        database_config,
        tokio_postgres::NoTls,
    );
    Pool::builder(manager)
        .max_size(pool_size)
        .build()
        .expect("failed to build connection pool")
}
