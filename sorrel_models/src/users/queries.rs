use uuid::Uuid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};
use crate::profiles::queries::create_profile;
use crate::profiles::types::{DbActorProfile, ProfileCreateData};

use super::types::{DbUser, User, UserCreateData};

pub async fn create_user(
    db_client: &mut impl DatabaseClient,
    user_data: UserCreateData,
) -> Result<User, DatabaseError> {
    let transaction = db_client.transaction().await?;
    let profile_data = ProfileCreateData {
        username: user_data.username.clone(),
        hostname: None,
        display_name: None,
        bio: None,
        public_keys: vec![],
        actor_json: None,
    };
    let profile = create_profile(&transaction, profile_data).await?;
    let row = transaction.query_one(
        "
        INSERT INTO user_account (
            id,
            password_hash,
            rsa_secret_key
        )
        VALUES ($1, $2, $3)
        RETURNING user_account
        ",
        &[
            &profile.id,
            &user_data.password_hash,
            &user_data.rsa_secret_key,
        ],
    ).await.map_err(catch_unique_violation("user"))?;
    let db_user: DbUser = row.try_get("user_account")?;
    let user = User::new(db_user, profile)?;
    transaction.commit().await?;
    Ok(user)
}

pub async fn get_user_by_id(
    db_client: &impl DatabaseClient,
    user_id: Uuid,
) -> Result<User, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT user_account, actor_profile
        FROM user_account
        JOIN actor_profile ON user_account.id = actor_profile.id
        WHERE user_account.id = $1
        ",
        &[&user_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("user"))?;
    let db_user: DbUser = row.try_get("user_account")?;
    let db_profile: DbActorProfile = row.try_get("actor_profile")?;
    let user = User::new(db_user, db_profile)?;
    Ok(user)
}

pub async fn get_user_by_name(
    db_client: &impl DatabaseClient,
    username: &str,
) -> Result<User, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT user_account, actor_profile
        FROM user_account
        JOIN actor_profile ON user_account.id = actor_profile.id
        WHERE actor_profile.username = $1 AND actor_profile.hostname IS NULL
        ",
        &[&username],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("user"))?;
    let db_user: DbUser = row.try_get("user_account")?;
    let db_profile: DbActorProfile = row.try_get("actor_profile")?;
    let user = User::new(db_user, db_profile)?;
    Ok(user)
}

pub async fn get_user_count(
    db_client: &impl DatabaseClient,
) -> Result<i64, DatabaseError> {
    let row = db_client.query_one(
        "SELECT count(user_account) AS user_count FROM user_account",
        &[],
    ).await?;
    let count = row.try_get("user_count")?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use sorrel_utils::crypto_rsa::{
        generate_weak_rsa_key,
        rsa_secret_key_to_pkcs8_pem,
    };
    use crate::database::test_utils::create_test_database;
    use super::*;

    fn test_user_data(username: &str) -> UserCreateData {
        let secret_key = generate_weak_rsa_key().unwrap();
        let secret_key_pem = rsa_secret_key_to_pkcs8_pem(&secret_key).unwrap();
        UserCreateData {
            username: username.to_string(),
            password_hash: None,
            rsa_secret_key: secret_key_pem,
        }
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_user() {
        let db_client = &mut create_test_database().await;
        let user = create_user(db_client, test_user_data("myname"))
            .await.unwrap();
        assert_eq!(user.profile.username, "myname");
        assert_eq!(user.profile.is_local(), true);
        let user = get_user_by_name(db_client, "myname").await.unwrap();
        assert_eq!(get_user_count(db_client).await.unwrap(), 1);
        assert_eq!(user.profile.username, "myname");
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_user_duplicate_username() {
        let db_client = &mut create_test_database().await;
        create_user(db_client, test_user_data("myname")).await.unwrap();
        let result = create_user(db_client, test_user_data("myname")).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists(_))));
    }
}
