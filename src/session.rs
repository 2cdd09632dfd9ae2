use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

use crate::{
    AppState,
    auth::Authenticator,
    entities::session,
    error::{AppError, AppResult},
    models::User,
};

pub const SESSION_COOKIE: &str = "filmlib_session";

/// Resolves session tokens to users. Sessions live in the database, so the identity is
/// looked up once per request and handed to handlers as a value.
#[derive(Clone)]
pub struct SessionGuard {
    db: DatabaseConnection,
    users: Authenticator,
    ttl_seconds: i64,
}

impl SessionGuard {
    pub fn new(db: DatabaseConnection, users: Authenticator, ttl_seconds: i64) -> Self {
        Self { db, users, ttl_seconds }
    }

    pub async fn open(&self, user_id: i32) -> AppResult<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        session::ActiveModel {
            token: Set(token.clone()),
            user_id: Set(user_id),
            expires_at: Set(now_sec() + self.ttl_seconds),
        }
        .insert(&self.db)
        .await?;
        debug!(user_id, "session opened");
        Ok(token)
    }

    pub async fn resolve(&self, token: &str) -> AppResult<Option<User>> {
        let Some(row) = session::Entity::find_by_id(token.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        if row.expires_at <= now_sec() {
            debug!(user_id = row.user_id, "session expired");
            self.close(token).await?;
            return Ok(None);
        }

        self.users.find_user(row.user_id).await
    }

    pub async fn close(&self, token: &str) -> AppResult<()> {
        session::Entity::delete_many()
            .filter(session::Column::Token.eq(token))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.ttl_seconds))
            .build()
    }

    pub fn removal_cookie() -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }

    async fn user_from_parts(&self, parts: &Parts) -> AppResult<Option<User>> {
        let jar = CookieJar::from_headers(&parts.headers);
        match jar.get(SESSION_COOKIE) {
            Some(cookie) => self.resolve(cookie.value()).await,
            None => Ok(None),
        }
    }
}

/// An authenticated caller. Rejects with `401` before the handler body runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state
            .sessions
            .user_from_parts(parts)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))
    }
}

/// A caller who may or may not be logged in.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Viewer(state.sessions.user_from_parts(parts).await?))
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
