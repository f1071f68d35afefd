use regex::Regex;

use sorrel_config::Config;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::profiles::types::DbActorProfile;
use sorrel_models::relationships::queries::unfollow;
use sorrel_models::users::queries::create_user;
use sorrel_models::users::types::{User, UserCreateData};
use sorrel_utils::crypto_rsa::{
    generate_rsa_key,
    rsa_secret_key_to_pkcs8_pem,
};

use crate::builders::follow::follow_or_create_request;
use crate::builders::undo_follow::prepare_undo_follow;
use crate::errors::{HandlerError, ValidationError};

const USERNAME_RE: &str = r"^[0-9A-Za-z_]+$";

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() || username.len() > 100 {
        return Err(ValidationError("invalid username length"));
    };
    let username_re = Regex::new(USERNAME_RE).expect("regexp should be valid");
    if !username_re.is_match(username) {
        return Err(ValidationError("invalid characters in username"));
    };
    Ok(())
}

/// Creates a local account with a fresh RSA keypair
pub async fn register_user(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    username: &str,
    password_hash: Option<String>,
) -> Result<User, HandlerError> {
    if !config.registrations_open {
        return Err(ValidationError("registrations are closed").into());
    };
    validate_username(username)?;
    // Key generation is slow; run it on a blocking thread
    let rsa_secret_key = tokio::task::spawn_blocking(generate_rsa_key)
        .await
        .map_err(|_| HandlerError::ValidationError("key generation failed".to_string()))?
        .map_err(|_| HandlerError::ValidationError("key generation failed".to_string()))?;
    let rsa_secret_key_pem = rsa_secret_key_to_pkcs8_pem(&rsa_secret_key)
        .map_err(|_| HandlerError::ValidationError("key serialization failed".to_string()))?;
    let user_data = UserCreateData {
        username: username.to_string(),
        password_hash,
        rsa_secret_key: rsa_secret_key_pem,
    };
    let user = create_user(db_client, user_data).await?;
    log::info!("registered user {}", user.profile.username);
    Ok(user)
}

pub async fn follow_actor(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    current_user: &User,
    target_profile: &DbActorProfile,
) -> Result<(), DatabaseError> {
    follow_or_create_request(
        db_client,
        &config.instance(),
        current_user,
        target_profile,
    ).await
}

pub async fn unfollow_actor(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    current_user: &User,
    target_profile: &DbActorProfile,
) -> Result<(), DatabaseError> {
    unfollow(db_client, current_user.id, target_profile.id).await?;
    if let Some(ref remote_actor) = target_profile.actor_json {
        prepare_undo_follow(
            &config.instance(),
            current_user,
            remote_actor,
        ).enqueue(db_client).await?;
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("alice").is_ok(), true);
        assert_eq!(validate_username("alice_1").is_ok(), true);
        assert_eq!(validate_username("").is_err(), true);
        assert_eq!(validate_username("alice@peer").is_err(), true);
    }
}
