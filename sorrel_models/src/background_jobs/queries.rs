use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use sorrel_utils::id::generate_ulid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::{DbBackgroundJob, JobStatus, JobType};

pub async fn enqueue_job(
    db_client: &impl DatabaseClient,
    job_type: JobType,
    job_data: &Value,
    scheduled_for: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let job_id = generate_ulid();
    db_client.execute(
        "
        INSERT INTO background_job (
            id,
            job_type,
            job_data,
            job_status,
            scheduled_for
        )
        VALUES ($1, $2, $3, $4, $5)
        ",
        &[
            &job_id,
            &job_type,
            &job_data,
            &JobStatus::Queued,
            &scheduled_for,
        ],
    ).await?;
    Ok(())
}

/// Claims a batch of due jobs. Jobs that stay in the running state
/// longer than the timeout are considered abandoned and are re-claimed.
pub async fn get_job_batch(
    db_client: &impl DatabaseClient,
    job_type: JobType,
    batch_size: u32,
    job_timeout: u32,
) -> Result<Vec<DbBackgroundJob>, DatabaseError> {
    let job_timeout_at = Utc::now() - Duration::seconds(job_timeout.into());
    let rows = db_client.query(
        "
        UPDATE background_job
        SET job_status = $1, updated_at = CURRENT_TIMESTAMP
        WHERE id IN (
            SELECT id
            FROM background_job
            WHERE
                job_type = $2
                AND (
                    job_status = $3 AND scheduled_for <= CURRENT_TIMESTAMP
                    OR job_status = $1 AND updated_at <= $4
                )
            ORDER BY scheduled_for
            LIMIT $5
        )
        RETURNING background_job
        ",
        &[
            &JobStatus::Running,
            &job_type,
            &JobStatus::Queued,
            &job_timeout_at,
            &i64::from(batch_size),
        ],
    ).await?;
    let jobs = rows.iter()
        .map(|row| row.try_get("background_job"))
        .collect::<Result<_, _>>()?;
    Ok(jobs)
}

pub async fn delete_job_from_queue(
    db_client: &impl DatabaseClient,
    job_id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        DELETE FROM background_job
        WHERE id = $1
        ",
        &[&job_id],
    ).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use serial_test::serial;
    use crate::database::test_utils::create_test_database;
    use super::*;

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_enqueue_and_claim_job() {
        let db_client = &create_test_database().await;
        let job_data = json!({"test": 1});
        enqueue_job(
            db_client,
            JobType::OutgoingActivity,
            &job_data,
            Utc::now(),
        ).await.unwrap();
        let batch = get_job_batch(
            db_client,
            JobType::OutgoingActivity,
            10,
            3600,
        ).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].job_data, job_data);
        // Claimed jobs are not returned again
        let repeated_batch = get_job_batch(
            db_client,
            JobType::OutgoingActivity,
            10,
            3600,
        ).await.unwrap();
        assert_eq!(repeated_batch.len(), 0);
        delete_job_from_queue(db_client, batch[0].id).await.unwrap();
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_job_not_due_yet() {
        let db_client = &create_test_database().await;
        let job_data = json!({});
        let scheduled_for = Utc::now() + Duration::seconds(600);
        enqueue_job(
            db_client,
            JobType::OutgoingActivity,
            &job_data,
            scheduled_for,
        ).await.unwrap();
        let batch = get_job_batch(
            db_client,
            JobType::OutgoingActivity,
            10,
            3600,
        ).await.unwrap();
        assert_eq!(batch.len(), 0);
    }
}
