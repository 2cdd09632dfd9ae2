use std::{future::Future, time::Duration};

use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    filters::FilterLink,
    models::{Credentials, Film, FilmDraft, User},
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cannot communicate with the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Server { status: 401, .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The REST surface as the client store sees it.
pub trait FilmApi: Send + Sync + 'static {
    fn list_films(&self, filter: Option<&str>) -> impl Future<Output = ApiResult<Vec<Film>>> + Send;

    fn get_film(&self, id: i32) -> impl Future<Output = ApiResult<Film>> + Send;

    fn create_film(&self, draft: &FilmDraft) -> impl Future<Output = ApiResult<Film>> + Send;

    fn update_film(&self, film: &Film) -> impl Future<Output = ApiResult<Film>> + Send;

    fn delete_film(&self, id: i32) -> impl Future<Output = ApiResult<()>> + Send;

    fn filters(&self) -> impl Future<Output = ApiResult<Vec<FilterLink>>> + Send;

    fn login(&self, credentials: &Credentials) -> impl Future<Output = ApiResult<User>> + Send;

    fn logout(&self) -> impl Future<Output = ApiResult<()>> + Send;

    fn current_user(&self) -> impl Future<Output = ApiResult<User>> + Send;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`FilmApi`] over HTTP. The session cookie is kept in the client's cookie store.
#[derive(Clone)]
pub struct HttpFilmApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFilmApi {
    /// `base_url` is the API root, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("filmlib/0.1")
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl FilmApi for HttpFilmApi {
    async fn list_films(&self, filter: Option<&str>) -> ApiResult<Vec<Film>> {
        let mut req = self.client.get(self.url("films"));
        if let Some(filter) = filter {
            req = req.query(&[("filter", filter)]);
        }
        read_json(req.send().await?).await
    }

    async fn get_film(&self, id: i32) -> ApiResult<Film> {
        read_json(self.client.get(self.url(&format!("films/{id}"))).send().await?).await
    }

    async fn create_film(&self, draft: &FilmDraft) -> ApiResult<Film> {
        read_json(self.client.post(self.url("films")).json(draft).send().await?).await
    }

    async fn update_film(&self, film: &Film) -> ApiResult<Film> {
        let url = self.url(&format!("films/{}", film.id));
        read_json(self.client.put(url).json(film).send().await?).await
    }

    async fn delete_film(&self, id: i32) -> ApiResult<()> {
        let resp = self.client.delete(self.url(&format!("films/{id}"))).send().await?;
        expect_success(resp).await
    }

    async fn filters(&self) -> ApiResult<Vec<FilterLink>> {
        read_json(self.client.get(self.url("filters")).send().await?).await
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        read_json(self.client.post(self.url("sessions")).json(credentials).send().await?).await
    }

    async fn logout(&self) -> ApiResult<()> {
        expect_success(self.client.delete(self.url("sessions/current")).send().await?).await
    }

    async fn current_user(&self) -> ApiResult<User> {
        read_json(self.client.get(self.url("sessions/current")).send().await?).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> ApiResult<T> {
    if !resp.status().is_success() {
        return Err(server_error(resp).await);
    }
    Ok(resp.json().await?)
}

async fn expect_success(resp: reqwest::Response) -> ApiResult<()> {
    if resp.status().is_success() { Ok(()) } else { Err(server_error(resp).await) }
}

async fn server_error(resp: reqwest::Response) -> ApiError {
    let status = resp.status().as_u16();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => "Cannot parse server response".to_string(),
    };
    ApiError::Server { status, message }
}
