//! Username/password verification.
//!
//! Hashes are Argon2id PHC strings, so parameters and salt travel with the hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info};

use crate::{
    entities::user,
    error::{AppError, AppResult},
    models::User,
};

/// Accounts created by `SEED_DEMO_USERS=true`: (username, display name, password).
pub const DEMO_USERS: &[(&str, &str, &str)] = &[
    ("john.doe@polito.it", "John", "password"),
    ("mario.rossi@polito.it", "Mario", "password"),
];

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[derive(Clone)]
pub struct Authenticator {
    db: DatabaseConnection,
}

impl Authenticator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// `Ok(None)` for an unknown user or a wrong password; the two are not distinguished.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let Some(row) = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
        else {
            debug!(username = %username, "login for unknown user");
            return Ok(None);
        };

        let ok = verify_password(password, &row.password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored password hash unusable: {e}")))?;
        if !ok {
            debug!(username = %username, "login with wrong password");
            return Ok(None);
        }

        Ok(Some(row.into()))
    }

    pub async fn find_user(&self, id: i32) -> AppResult<Option<User>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?.map(User::from))
    }

    pub async fn create_user(&self, username: &str, name: &str, password: &str) -> AppResult<User> {
        let password_hash = hash_password(password)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing password: {e}")))?;
        let row = user::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            name: Set(name.to_string()),
            password_hash: Set(password_hash),
        }
        .insert(&self.db)
        .await?;
        info!(user_id = row.id, username = %username, "user created");
        Ok(row.into())
    }

    pub async fn seed_demo_users(&self) -> AppResult<()> {
        for (username, name, password) in DEMO_USERS {
            let exists = user::Entity::find()
                .filter(user::Column::Username.eq(*username))
                .one(&self.db)
                .await?
                .is_some();
            if !exists {
                self.create_user(username, name, password).await?;
            }
        }
        Ok(())
    }
}
