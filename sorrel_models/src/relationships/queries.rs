use uuid::Uuid;

use sorrel_utils::id::generate_ulid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};
use crate::profiles::queries::{
    update_follower_count,
    update_following_count,
};
use crate::profiles::types::DbActorProfile;

use super::types::{DbFollowRequest, FollowRequestCreateData};

pub async fn is_following(
    db_client: &impl DatabaseClient,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<bool, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT 1 AS exists
        FROM relationship
        WHERE source_id = $1 AND target_id = $2
        ",
        &[&source_id, &target_id],
    ).await?;
    Ok(maybe_row.is_some())
}

pub async fn follow(
    db_client: &mut impl DatabaseClient,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<(), DatabaseError> {
    let transaction = db_client.transaction().await?;
    transaction.execute(
        "
        INSERT INTO relationship (source_id, target_id)
        VALUES ($1, $2)
        ",
        &[&source_id, &target_id],
    ).await.map_err(catch_unique_violation("relationship"))?;
    update_follower_count(&transaction, target_id, 1).await?;
    update_following_count(&transaction, source_id, 1).await?;
    transaction.commit().await?;
    Ok(())
}

/// Deletes both the relationship and a matching follow request
pub async fn unfollow(
    db_client: &mut impl DatabaseClient,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<(), DatabaseError> {
    let transaction = db_client.transaction().await?;
    let deleted_count = transaction.execute(
        "
        DELETE FROM relationship
        WHERE source_id = $1 AND target_id = $2
        ",
        &[&source_id, &target_id],
    ).await?;
    let relationship_deleted = deleted_count > 0;
    let request_deleted_count = transaction.execute(
        "
        DELETE FROM follow_request
        WHERE source_id = $1 AND target_id = $2
        ",
        &[&source_id, &target_id],
    ).await?;
    if !relationship_deleted && request_deleted_count == 0 {
        return Err(DatabaseError::NotFound("relationship"));
    };
    if relationship_deleted {
        // Update counters only if relationship existed
        update_follower_count(&transaction, target_id, -1).await?;
        update_following_count(&transaction, source_id, -1).await?;
    };
    transaction.commit().await?;
    Ok(())
}

pub async fn get_followers(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
) -> Result<Vec<DbActorProfile>, DatabaseError> {
    let rows = db_client.query(
        "
        SELECT actor_profile
        FROM actor_profile
        JOIN relationship ON actor_profile.id = relationship.source_id
        WHERE relationship.target_id = $1
        ORDER BY relationship.id DESC
        ",
        &[&profile_id],
    ).await?;
    let profiles = rows.iter()
        .map(|row| row.try_get("actor_profile"))
        .collect::<Result<_, _>>()?;
    Ok(profiles)
}

/// Creates a follow request or updates the activity ID of an existing one
pub async fn create_follow_request(
    db_client: &impl DatabaseClient,
    request_data: FollowRequestCreateData,
) -> Result<DbFollowRequest, DatabaseError> {
    let request_id = generate_ulid();
    let row = db_client.query_one(
        "
        INSERT INTO follow_request (
            id,
            source_id,
            target_id,
            activity_id,
            direction
        )
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (source_id, target_id)
        DO UPDATE SET activity_id = $4
        RETURNING follow_request
        ",
        &[
            &request_id,
            &request_data.source_id,
            &request_data.target_id,
            &request_data.activity_id,
            &request_data.direction,
        ],
    ).await.map_err(catch_unique_violation("follow request"))?;
    let request = row.try_get("follow_request")?;
    Ok(request)
}

pub async fn get_follow_request_by_id(
    db_client: &impl DatabaseClient,
    request_id: Uuid,
) -> Result<DbFollowRequest, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT follow_request
        FROM follow_request
        WHERE id = $1
        ",
        &[&request_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("follow request"))?;
    let request = row.try_get("follow_request")?;
    Ok(request)
}

pub async fn get_follow_request_by_activity_id(
    db_client: &impl DatabaseClient,
    activity_id: &str,
) -> Result<DbFollowRequest, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT follow_request
        FROM follow_request
        WHERE activity_id = $1
        ",
        &[&activity_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("follow request"))?;
    let request = row.try_get("follow_request")?;
    Ok(request)
}

/// Materializes the relationship and removes the follow request.
/// Both writes happen in one transaction; re-delivery of Accept
/// does not create duplicate rows.
pub async fn follow_request_accepted(
    db_client: &mut impl DatabaseClient,
    request_id: Uuid,
) -> Result<(), DatabaseError> {
    let transaction = db_client.transaction().await?;
    let maybe_row = transaction.query_opt(
        "
        DELETE FROM follow_request
        WHERE id = $1
        RETURNING source_id, target_id
        ",
        &[&request_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("follow request"))?;
    let source_id: Uuid = row.try_get("source_id")?;
    let target_id: Uuid = row.try_get("target_id")?;
    let inserted_count = transaction.execute(
        "
        INSERT INTO relationship (source_id, target_id)
        VALUES ($1, $2)
        ON CONFLICT (source_id, target_id) DO NOTHING
        ",
        &[&source_id, &target_id],
    ).await?;
    if inserted_count > 0 {
        update_follower_count(&transaction, target_id, 1).await?;
        update_following_count(&transaction, source_id, 1).await?;
    };
    transaction.commit().await?;
    Ok(())
}

pub async fn delete_follow_request(
    db_client: &impl DatabaseClient,
    request_id: Uuid,
) -> Result<(), DatabaseError> {
    let deleted_count = db_client.execute(
        "
        DELETE FROM follow_request
        WHERE id = $1
        ",
        &[&request_id],
    ).await?;
    if deleted_count == 0 {
        return Err(DatabaseError::NotFound("follow request"));
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use crate::database::test_utils::create_test_database;
    use crate::profiles::queries::{create_profile, get_profile_by_id};
    use crate::profiles::types::ProfileCreateData;
    use crate::relationships::types::FollowRequestDirection;
    use super::*;

    async fn create_test_profile(
        db_client: &impl DatabaseClient,
        username: &str,
    ) -> DbActorProfile {
        let profile_data = ProfileCreateData {
            username: username.to_string(),
            hostname: None,
            display_name: None,
            bio: None,
            public_keys: vec![],
            actor_json: None,
        };
        create_profile(db_client, profile_data).await.unwrap()
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_follow_unfollow() {
        let db_client = &mut create_test_database().await;
        let source = create_test_profile(db_client, "follower").await;
        let target = create_test_profile(db_client, "followee").await;
        follow(db_client, source.id, target.id).await.unwrap();
        assert_eq!(is_following(db_client, source.id, target.id).await.unwrap(), true);
        let target = get_profile_by_id(db_client, target.id).await.unwrap();
        assert_eq!(target.follower_count, 1);

        // Duplicate follow is reported
        let result = follow(db_client, source.id, target.id).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists(_))));

        unfollow(db_client, source.id, target.id).await.unwrap();
        assert_eq!(is_following(db_client, source.id, target.id).await.unwrap(), false);
        let target = get_profile_by_id(db_client, target.id).await.unwrap();
        assert_eq!(target.follower_count, 0);

        // Unfollow with no relationship is reported
        let result = unfollow(db_client, source.id, target.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_follow_request_accepted() {
        let db_client = &mut create_test_database().await;
        let source = create_test_profile(db_client, "follower").await;
        let target = create_test_profile(db_client, "followee").await;
        let request = create_follow_request(
            db_client,
            FollowRequestCreateData {
                source_id: source.id,
                target_id: target.id,
                activity_id: Some("https://remote.example/f1".to_string()),
                direction: FollowRequestDirection::Incoming,
            },
        ).await.unwrap();
        follow_request_accepted(db_client, request.id).await.unwrap();
        assert_eq!(is_following(db_client, source.id, target.id).await.unwrap(), true);
        let result = get_follow_request_by_id(db_client, request.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_follow_request_updates_activity_id() {
        let db_client = &mut create_test_database().await;
        let source = create_test_profile(db_client, "follower").await;
        let target = create_test_profile(db_client, "followee").await;
        let request_1 = create_follow_request(
            db_client,
            FollowRequestCreateData {
                source_id: source.id,
                target_id: target.id,
                activity_id: Some("https://remote.example/f1".to_string()),
                direction: FollowRequestDirection::Incoming,
            },
        ).await.unwrap();
        let request_2 = create_follow_request(
            db_client,
            FollowRequestCreateData {
                source_id: source.id,
                target_id: target.id,
                activity_id: Some("https://remote.example/f2".to_string()),
                direction: FollowRequestDirection::Incoming,
            },
        ).await.unwrap();
        assert_eq!(request_1.id, request_2.id);
        assert_eq!(
            request_2.activity_id.as_deref(),
            Some("https://remote.example/f2"),
        );
    }
}
