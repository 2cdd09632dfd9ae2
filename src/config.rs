use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub cors_origin: HeaderValue,
    pub session_ttl_hours: i64,
    pub seed_demo_users: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3001".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmlib.db?mode=rwc".to_string());

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let session_ttl_hours: i64 =
            std::env::var("SESSION_TTL_HOURS").ok().and_then(|s| s.parse().ok()).unwrap_or(168);

        let seed_demo_users = std::env::var("SEED_DEMO_USERS")
            .map(|s| matches!(s.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            cors_origin: HeaderValue::from_str(&cors_origin).context("CORS_ORIGIN")?,
            session_ttl_hours: session_ttl_hours.max(1),
            seed_demo_users,
        })
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_hours * 3_600
    }
}
