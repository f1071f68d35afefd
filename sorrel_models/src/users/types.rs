use chrono::{DateTime, Utc};
use postgres_types::FromSql;
use uuid::Uuid;

use sorrel_utils::crypto_rsa::{
    rsa_secret_key_from_pkcs8_pem,
    RsaSecretKey,
};

use crate::database::DatabaseTypeError;
use crate::profiles::types::DbActorProfile;

#[allow(dead_code)]
#[derive(FromSql)]
#[postgres(name = "user_account")]
pub struct DbUser {
    id: Uuid,
    password_hash: Option<String>,
    rsa_secret_key: String,
    created_at: DateTime<Utc>,
}

/// Represents local user
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub password_hash: Option<String>,
    pub rsa_secret_key: RsaSecretKey,
    pub profile: DbActorProfile,
}

impl User {
    pub fn new(
        db_user: DbUser,
        db_profile: DbActorProfile,
    ) -> Result<Self, DatabaseTypeError> {
        if db_user.id != db_profile.id || !db_profile.is_local() {
            return Err(DatabaseTypeError);
        };
        let rsa_secret_key =
            rsa_secret_key_from_pkcs8_pem(&db_user.rsa_secret_key)
                .map_err(|_| DatabaseTypeError)?;
        let user = Self {
            id: db_user.id,
            password_hash: db_user.password_hash,
            rsa_secret_key,
            profile: db_profile,
        };
        Ok(user)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for User {
    fn default() -> Self {
        use sorrel_utils::crypto_rsa::generate_weak_rsa_key;
        let profile = DbActorProfile::default();
        Self {
            id: profile.id,
            password_hash: None,
            rsa_secret_key: generate_weak_rsa_key().unwrap(),
            profile,
        }
    }
}

pub struct UserCreateData {
    pub username: String,
    pub password_hash: Option<String>,
    pub rsa_secret_key: String, // PKCS#8 PEM
}
