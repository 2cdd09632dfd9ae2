use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    AppState,
    error::{AppError, AppResult},
    filters::FilterLink,
    models::{Credentials, FavoritePatch, Film, FilmPayload, RatingPatch, User},
    session::{CurrentUser, SESSION_COOKIE, SessionGuard, Viewer},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    filter: Option<String>,
}

pub async fn list_films(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Film>>> {
    let Query(q) = query?;
    let films = state.films.list(viewer.id(), q.filter.as_deref()).await?;
    Ok(Json(films))
}

/// Films belonging to someone else answer exactly like missing ones.
pub async fn get_film(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Film>> {
    let Path(id) = path?;
    let film = state.films.get(id).await?;
    if viewer.id() != Some(film.owner) {
        return Err(AppError::film_not_found(id));
    }
    Ok(Json(film))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<FilmPayload>, JsonRejection>,
) -> AppResult<Json<Film>> {
    let Json(payload) = body?;
    let draft = payload.validate()?;
    let film = state.films.create(user.id, draft).await?;
    Ok(Json(film))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<FilmPayload>, JsonRejection>,
) -> AppResult<Json<Film>> {
    let Path(id) = path?;
    let Json(payload) = body?;
    let body_id = payload.id;
    let draft = payload.validate()?;
    ensure_same_id(id, body_id)?;

    let film = state.films.update(id, user.id, draft).await?;
    Ok(Json(film))
}

pub async fn set_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<FavoritePatch>, JsonRejection>,
) -> AppResult<Json<Film>> {
    let Path(id) = path?;
    let Json(patch) = body?;
    ensure_same_id(id, Some(patch.id))?;
    let film = state.films.set_favorite(id, user.id, patch.favorite).await?;
    Ok(Json(film))
}

pub async fn set_rating(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<RatingPatch>, JsonRejection>,
) -> AppResult<Json<Film>> {
    let Path(id) = path?;
    let Json(patch) = body?;
    ensure_same_id(id, Some(patch.id))?;
    let film = state.films.set_rating(id, user.id, patch.rating).await?;
    Ok(Json(film))
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    state.films.delete(id, user.id).await?;
    Ok(Json(json!({})))
}

pub async fn list_filters(State(state): State<Arc<AppState>>) -> Json<Vec<FilterLink>> {
    Json(state.films.catalog().links())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<(CookieJar, Json<User>)> {
    let Json(creds) = body?;
    let Some(user) = state.users.authenticate(&creds.username, &creds.password).await? else {
        return Err(AppError::Unauthenticated("Incorrect username and/or password.".to_string()));
    };

    if let Some(old) = jar.get(SESSION_COOKIE) {
        state.sessions.close(old.value()).await?;
    }

    let token = state.sessions.open(user.id).await?;
    info!(user_id = user.id, "logged in");
    Ok((jar.add(state.sessions.cookie(token)), Json(user)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.close(cookie.value()).await?;
    }
    Ok((jar.remove(SessionGuard::removal_cookie()), StatusCode::OK))
}

pub async fn current_session(viewer: Viewer) -> AppResult<Json<User>> {
    viewer
        .0
        .map(Json)
        .ok_or_else(|| AppError::Unauthenticated("Unauthenticated user!".to_string()))
}

fn ensure_same_id(path_id: i32, body_id: Option<i64>) -> AppResult<()> {
    if body_id == Some(i64::from(path_id)) { Ok(()) } else { Err(AppError::IdMismatch) }
}
