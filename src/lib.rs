pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod filters;
pub mod models;
pub mod routes;
pub mod service;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::Authenticator, config::Config, filters::FilterCatalog, service::FilmService,
    session::SessionGuard, store::RecordStore,
};

pub struct AppState {
    pub config: Arc<Config>,
    pub films: FilmService,
    pub users: Authenticator,
    pub sessions: SessionGuard,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: DatabaseConnection) -> Self {
        let users = Authenticator::new(db.clone());
        let sessions = SessionGuard::new(db.clone(), users.clone(), config.session_ttl_seconds());
        let films = FilmService::new(RecordStore::new(db), FilterCatalog::default());
        Self { config, films, users, sessions }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let api = Router::new()
        .route("/films", get(routes::list_films).post(routes::create_film))
        .route(
            "/films/{id}",
            get(routes::get_film).put(routes::update_film).delete(routes::delete_film),
        )
        .route("/films/{id}/favorite", put(routes::set_favorite))
        .route("/films/{id}/rating", put(routes::set_rating))
        .route("/filters", get(routes::list_filters))
        .route("/sessions", axum::routing::post(routes::login))
        .route(
            "/sessions/current",
            get(routes::current_session).delete(routes::logout),
        );

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
