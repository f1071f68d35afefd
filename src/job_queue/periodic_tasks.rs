use sorrel_activitypub::queues::process_queued_outgoing_activities;
use sorrel_config::Config;
use sorrel_models::database::{DatabaseConnectionPool, DatabaseError};

pub async fn outgoing_activity_queue_executor(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
) -> Result<(), DatabaseError> {
    process_queued_outgoing_activities(config, db_pool).await
}
