use uuid::Uuid;

use sorrel_utils::id::generate_ulid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};

use super::types::{
    DbActorProfile,
    DbPublicKeys,
    ProfileCreateData,
    ProfileUpdateData,
};

pub async fn create_profile(
    db_client: &impl DatabaseClient,
    profile_data: ProfileCreateData,
) -> Result<DbActorProfile, DatabaseError> {
    let profile_id = generate_ulid();
    let actor_id = profile_data.actor_json.as_ref()
        .map(|actor| actor.id.clone());
    let row = db_client.query_one(
        "
        INSERT INTO actor_profile (
            id,
            username,
            hostname,
            display_name,
            bio,
            public_keys,
            actor_json,
            actor_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING actor_profile
        ",
        &[
            &profile_id,
            &profile_data.username,
            &profile_data.hostname,
            &profile_data.display_name,
            &profile_data.bio,
            &DbPublicKeys(profile_data.public_keys),
            &profile_data.actor_json,
            &actor_id,
        ],
    ).await.map_err(catch_unique_violation("profile"))?;
    let profile: DbActorProfile = row.try_get("actor_profile")?;
    profile.check_consistency()?;
    Ok(profile)
}

/// Updates remote profile data and public keys; refreshes fetch timestamp
pub async fn update_profile(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
    profile_data: ProfileUpdateData,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        UPDATE actor_profile
        SET
            display_name = $1,
            bio = $2,
            public_keys = $3,
            actor_json = $4,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $5
        RETURNING actor_profile
        ",
        &[
            &profile_data.display_name,
            &profile_data.bio,
            &DbPublicKeys(profile_data.public_keys),
            &profile_data.actor_json,
            &profile_id,
        ],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

pub async fn get_profile_by_id(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT actor_profile
        FROM actor_profile
        WHERE id = $1
        ",
        &[&profile_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

pub async fn get_profile_by_acct(
    db_client: &impl DatabaseClient,
    username: &str,
    hostname: Option<&str>,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT actor_profile
        FROM actor_profile
        WHERE username = $1 AND hostname IS NOT DISTINCT FROM $2
        ",
        &[&username, &hostname],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

pub async fn get_remote_profile_by_actor_id(
    db_client: &impl DatabaseClient,
    actor_id: &str,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT actor_profile
        FROM actor_profile
        WHERE actor_id = $1
        ",
        &[&actor_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

pub async fn update_follower_count(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
    change: i32,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        UPDATE actor_profile
        SET follower_count = follower_count + $1
        WHERE id = $2
        RETURNING actor_profile
        ",
        &[&change, &profile_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

pub async fn update_following_count(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
    change: i32,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        UPDATE actor_profile
        SET following_count = following_count + $1
        WHERE id = $2
        RETURNING actor_profile
        ",
        &[&change, &profile_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

pub async fn update_post_count(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
    change: i32,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        UPDATE actor_profile
        SET post_count = post_count + $1
        WHERE id = $2
        RETURNING actor_profile
        ",
        &[&change, &profile_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("profile"))?;
    let profile = row.try_get("actor_profile")?;
    Ok(profile)
}

/// Deletes profile and all objects that belong to it
pub async fn delete_profile(
    db_client: &mut impl DatabaseClient,
    profile_id: Uuid,
) -> Result<(), DatabaseError> {
    let transaction = db_client.transaction().await?;
    // Keep follower counters of other profiles in sync
    transaction.execute(
        "
        UPDATE actor_profile
        SET follower_count = follower_count - 1
        WHERE id IN (
            SELECT target_id FROM relationship WHERE source_id = $1
        )
        ",
        &[&profile_id],
    ).await?;
    transaction.execute(
        "
        UPDATE actor_profile
        SET following_count = following_count - 1
        WHERE id IN (
            SELECT source_id FROM relationship WHERE target_id = $1
        )
        ",
        &[&profile_id],
    ).await?;
    let deleted_count = transaction.execute(
        "DELETE FROM actor_profile WHERE id = $1",
        &[&profile_id],
    ).await?;
    if deleted_count == 0 {
        return Err(DatabaseError::NotFound("profile"));
    };
    transaction.commit().await?;
    Ok(())
}

pub async fn set_reachability_status(
    db_client: &impl DatabaseClient,
    actor_id: &str,
    is_reachable: bool,
) -> Result<(), DatabaseError> {
    if is_reachable {
        db_client.execute(
            "
            UPDATE actor_profile
            SET unreachable_since = NULL
            WHERE actor_id = $1
            ",
            &[&actor_id],
        ).await?;
    } else {
        // Timestamp is set on the first failed delivery only
        db_client.execute(
            "
            UPDATE actor_profile
            SET unreachable_since = CURRENT_TIMESTAMP
            WHERE actor_id = $1 AND unreachable_since IS NULL
            ",
            &[&actor_id],
        ).await?;
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use crate::database::test_utils::create_test_database;
    use crate::profiles::types::{DbActor, DbActorKey};
    use super::*;

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_profile_local() {
        let db_client = &create_test_database().await;
        let profile_data = ProfileCreateData {
            username: "test".to_string(),
            hostname: None,
            display_name: None,
            bio: None,
            public_keys: vec![],
            actor_json: None,
        };
        let profile = create_profile(db_client, profile_data).await.unwrap();
        assert_eq!(profile.username, "test");
        assert_eq!(profile.is_local(), true);
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_profile_remote_and_update_keys() {
        let db_client = &create_test_database().await;
        let actor_id = "https://remote.example/users/test";
        let profile_data = ProfileCreateData {
            username: "test".to_string(),
            hostname: Some("remote.example".to_string()),
            display_name: None,
            bio: None,
            public_keys: vec![DbActorKey {
                id: format!("{}#main-key", actor_id),
                public_key_pem: "test-pem".to_string(),
            }],
            actor_json: Some(DbActor {
                id: actor_id.to_string(),
                inbox: format!("{}/inbox", actor_id),
                outbox: format!("{}/outbox", actor_id),
                ..Default::default()
            }),
        };
        let profile = create_profile(db_client, profile_data).await.unwrap();
        assert_eq!(profile.expect_remote_actor_id(), actor_id);

        let update_data = ProfileUpdateData {
            display_name: Some("Test".to_string()),
            bio: None,
            public_keys: vec![DbActorKey {
                id: format!("{}#main-key", actor_id),
                public_key_pem: "new-pem".to_string(),
            }],
            actor_json: profile.actor_json.clone(),
        };
        let profile = update_profile(db_client, profile.id, update_data)
            .await.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Test"));
        let key = profile.public_keys
            .find_by_key_id(&format!("{}#main-key", actor_id))
            .unwrap();
        assert_eq!(key.public_key_pem, "new-pem");
    }
}
