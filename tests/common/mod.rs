#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode, header},
};
use filmlib::{AppState, config::Config, db, models::User};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "password";

/// A `Config` pointing at a private in-memory database.
pub fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        cors_origin: HeaderValue::from_static("http://localhost:5173"),
        session_ttl_hours: 1,
        seed_demo_users: false,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub db: DatabaseConnection,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Arc::new(test_config());
        let db = db::connect_and_migrate(&config.database_url).await.expect("database should open");
        let state = Arc::new(AppState::new(config, db.clone()));
        Self { router: filmlib::app(state.clone()), state, db }
    }

    pub async fn user(&self, username: &str) -> User {
        self.state.users.create_user(username, username, PASSWORD).await.expect("user should be created")
    }

    /// Logs in through the API and returns the `Cookie` header value for later requests.
    pub async fn login(&self, username: &str) -> String {
        let req = json_request(
            Method::POST,
            "/api/sessions",
            None,
            Some(json!({ "username": username, "password": PASSWORD })),
        );
        let resp = self.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .expect("login should set a cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(json_request(method, uri, cookie, body)).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    pub async fn create_film(&self, cookie: &str, body: Value) -> Value {
        let (status, film) = self.request(Method::POST, "/api/films", Some(cookie), Some(body)).await;
        assert_eq!(status, StatusCode::OK, "create failed: {film}");
        film
    }
}

pub fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn film_ids(list: &Value) -> Vec<i64> {
    list.as_array().unwrap().iter().map(|f| f["id"].as_i64().unwrap()).collect()
}
