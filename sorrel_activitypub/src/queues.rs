use chrono::{DateTime, Duration, Utc};
use futures::{stream::FuturesUnordered, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue};
use uuid::Uuid;

use sorrel_config::Config;
use sorrel_federation::deliver::send_object;
use sorrel_models::{
    background_jobs::queries::{
        delete_job_from_queue,
        enqueue_job,
        get_job_batch,
    },
    background_jobs::types::JobType,
    database::{
        get_database_client,
        DatabaseClient,
        DatabaseConnectionPool,
        DatabaseError,
        DatabaseTypeError,
    },
    profiles::queries::set_reachability_status,
    relationships::queries::{
        delete_follow_request,
        follow_request_accepted,
    },
};

use crate::agent::build_federation_agent_with_key;
use crate::deliverer::{Recipient, Sender};

const JOB_TIMEOUT: u32 = 3600; // 1 hour

// Deliveries that haven't succeeded by the deadline are abandoned
const DELIVERY_DEADLINE: i64 = 3600 * 48;

#[derive(Deserialize, Serialize)]
pub struct OutgoingActivityJobData {
    activity: JsonValue,
    sender: Sender,
    recipient: Recipient,
    failure_count: u32,
    expires_at: DateTime<Utc>,
    follow_request_id: Option<Uuid>,
}

impl OutgoingActivityJobData {
    pub(crate) fn new(
        activity: JsonValue,
        sender: Sender,
        recipient: Recipient,
        follow_request_id: Option<Uuid>,
    ) -> Self {
        Self {
            activity,
            sender,
            recipient,
            failure_count: 0,
            expires_at: Utc::now() + Duration::seconds(DELIVERY_DEADLINE),
            follow_request_id,
        }
    }

    pub(crate) async fn into_job(
        self,
        db_client: &impl DatabaseClient,
        delay: u32,
    ) -> Result<(), DatabaseError> {
        let job_data = serde_json::to_value(self)
            .expect("activity should be serializable");
        let scheduled_for = Utc::now() + Duration::seconds(delay.into());
        enqueue_job(
            db_client,
            JobType::OutgoingActivity,
            &job_data,
            scheduled_for,
        ).await
    }
}

// A follow request whose Accept can not be delivered is removed,
// allowing the peer to retry the follow later
async fn abandon_follow_request(
    db_client: &impl DatabaseClient,
    job_data: &OutgoingActivityJobData,
) -> Result<(), DatabaseError> {
    if let Some(follow_request_id) = job_data.follow_request_id {
        match delete_follow_request(db_client, follow_request_id).await {
            Ok(_) | Err(DatabaseError::NotFound(_)) => (),
            Err(other_error) => return Err(other_error),
        };
    };
    Ok(())
}

/// Exponential backoff with jitter, starting at the base interval
pub fn outgoing_queue_backoff(backoff_base: u32, failure_count: u32) -> u32 {
    debug_assert!(failure_count > 0);
    let exponent = failure_count.saturating_sub(1).min(16);
    let backoff = backoff_base.saturating_mul(2_u32.saturating_pow(exponent));
    let jitter = rand::thread_rng().gen_range(0..=backoff_base);
    backoff.saturating_add(jitter)
}

pub async fn process_queued_outgoing_activities(
    config: &Config,
    db_pool: &DatabaseConnectionPool,
) -> Result<(), DatabaseError> {
    let instance = config.instance();
    let batch = {
        let db_client = &**get_database_client(db_pool).await?;
        get_job_batch(
            db_client,
            JobType::OutgoingActivity,
            instance.federation.delivery_batch_size,
            JOB_TIMEOUT,
        ).await?
    };

    // Claimed jobs are delivered concurrently
    let mut delivery_pool = FuturesUnordered::new();
    for job in batch {
        let job_data: OutgoingActivityJobData =
            serde_json::from_value(job.job_data)
                .map_err(|_| DatabaseTypeError)?;
        let instance = instance.clone();
        delivery_pool.push(async move {
            let agent = build_federation_agent_with_key(
                &instance,
                job_data.sender.rsa_secret_key.clone(),
                job_data.sender.key_id.clone(),
            );
            let activity_json = job_data.activity.to_string();
            let result = send_object(
                &agent,
                &activity_json,
                &job_data.recipient.inbox,
            ).await;
            (job.id, job_data, result)
        });
    };

    while let Some((job_id, mut job_data, result)) = delivery_pool.next().await {
        let db_client = &mut **get_database_client(db_pool).await?;
        if !instance.federation.enabled {
            log::info!(
                "(private mode) not delivering activity to {}",
                job_data.recipient.inbox,
            );
            delete_job_from_queue(db_client, job_id).await?;
            continue;
        };
        match result {
            Ok(response) => {
                log::info!(
                    "delivered activity to {}: [{}]",
                    job_data.recipient.inbox,
                    response.status.as_str(),
                );
                set_reachability_status(
                    db_client,
                    &job_data.recipient.id,
                    true,
                ).await?;
                if let Some(follow_request_id) = job_data.follow_request_id {
                    // The follow becomes effective now that the Accept
                    // has reached the follower's server
                    match follow_request_accepted(
                        db_client,
                        follow_request_id,
                    ).await {
                        Ok(_) => (),
                        // Request was withdrawn while the job was in flight
                        Err(DatabaseError::NotFound(_)) => (),
                        Err(other_error) => return Err(other_error),
                    };
                };
            },
            Err(error) if error.is_recoverable() => {
                job_data.failure_count += 1;
                let max_attempts = instance.federation.delivery_max_attempts;
                if job_data.failure_count < max_attempts &&
                    job_data.expires_at > Utc::now()
                {
                    let retry_after = outgoing_queue_backoff(
                        instance.federation.delivery_backoff_base,
                        job_data.failure_count,
                    );
                    log::warn!(
                        "failed to deliver activity to {} ({}), retrying in {} seconds (attempt #{})",
                        job_data.recipient.inbox,
                        error,
                        retry_after,
                        job_data.failure_count,
                    );
                    job_data.into_job(db_client, retry_after).await?;
                } else {
                    log::warn!(
                        "delivery to {} abandoned after {} attempts",
                        job_data.recipient.inbox,
                        job_data.failure_count,
                    );
                    set_reachability_status(
                        db_client,
                        &job_data.recipient.id,
                        false,
                    ).await?;
                    abandon_follow_request(db_client, &job_data).await?;
                };
            },
            Err(error) => {
                // Terminal failure, drop the job
                log::warn!(
                    "failed to deliver activity to {}: {}",
                    job_data.recipient.inbox,
                    error,
                );
                abandon_follow_request(db_client, &job_data).await?;
            },
        };
        delete_job_from_queue(db_client, job_id).await?;
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_queue_backoff() {
        let backoff_base = 30;
        let backoff_1 = outgoing_queue_backoff(backoff_base, 1);
        assert!((30..=60).contains(&backoff_1));
        let backoff_2 = outgoing_queue_backoff(backoff_base, 2);
        assert!((60..=90).contains(&backoff_2));
        let backoff_5 = outgoing_queue_backoff(backoff_base, 5);
        assert!((480..=510).contains(&backoff_5));
    }

    #[test]
    fn test_outgoing_queue_backoff_does_not_overflow() {
        let backoff = outgoing_queue_backoff(30, 1000);
        assert!(backoff >= 30);
    }
}
