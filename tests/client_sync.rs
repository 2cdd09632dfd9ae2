//! The optimistic client store against a real server on a loopback port.

mod common;

use std::time::Duration;

use common::{PASSWORD, TestApp};
use filmlib::{
    client::{FilmApi, HttpFilmApi, OptimisticStore, Status},
    models::{Credentials, FilmDraft},
};
use tokio::net::TcpListener;

async fn serve(app: &TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn credentials(username: &str) -> Credentials {
    Credentials { username: username.to_string(), password: PASSWORD.to_string() }
}

fn draft(title: &str) -> FilmDraft {
    FilmDraft { title: title.to_string(), favorite: false, watch_date: None, rating: 5 }
}

async fn logged_in_store(app: &TestApp, username: &str) -> OptimisticStore<HttpFilmApi> {
    let base = serve(app).await;
    let store = OptimisticStore::new(HttpFilmApi::new(base).unwrap())
        .with_resync_delay(Duration::from_millis(10));
    store.login(&credentials(username)).await.unwrap();
    store.sync().await.unwrap();
    store
}

#[tokio::test]
async fn added_film_is_confirmed_after_sync() {
    let app = TestApp::new().await;
    app.user("john").await;
    let store = logged_in_store(&app, "john").await;
    assert_eq!(store.take_notice().as_deref(), Some("Welcome, john"));

    store.add_film(draft("Dune"));
    assert_eq!(store.films()[0].status(), Status::Added);

    store.settle().await;
    assert!(store.is_dirty());
    assert!(store.sync().await.unwrap());

    let films = store.films();
    assert_eq!(films.len(), 1);
    assert_eq!(films[0].status(), Status::Confirmed);
    assert_eq!(films[0].film().title, "Dune");
}

#[tokio::test]
async fn update_and_delete_round_trip() {
    let app = TestApp::new().await;
    app.user("john").await;
    let store = logged_in_store(&app, "john").await;

    store.add_film(draft("Heat"));
    store.settle().await;
    store.sync().await.unwrap();
    let mut film = store.films()[0].film().clone();

    film.title = "Heat (1995)".to_string();
    store.update_film(film.clone());
    assert_eq!(store.films()[0].status(), Status::Updated);
    store.settle().await;
    store.sync().await.unwrap();
    assert_eq!(store.films()[0].film().title, "Heat (1995)");

    store.delete_film(film.id);
    assert_eq!(store.films()[0].status(), Status::Deleted);
    store.settle().await;
    store.sync().await.unwrap();
    assert!(store.films().is_empty());
}

#[tokio::test]
async fn rejected_update_is_undone_by_the_resync() {
    let app = TestApp::new().await;
    app.user("john").await;
    let store = logged_in_store(&app, "john").await;

    store.add_film(draft("Alien"));
    store.settle().await;
    store.sync().await.unwrap();

    let mut film = store.films()[0].film().clone();
    film.rating = 9;
    store.update_film(film);
    store.settle().await;

    assert!(store.take_notice().unwrap().contains("rating"));
    store.sync().await.unwrap();
    assert_eq!(store.films()[0].film().rating, 5);
    assert_eq!(store.films()[0].status(), Status::Confirmed);
}

#[tokio::test]
async fn filter_changes_the_listing() {
    let app = TestApp::new().await;
    app.user("john").await;
    let store = logged_in_store(&app, "john").await;

    store.add_film(FilmDraft { rating: 1, ..draft("Cats") });
    store.add_film(draft("Alien"));
    store.settle().await;

    store.set_filter(Some("best-rated"));
    store.sync().await.unwrap();
    let titles: Vec<String> = store.films().iter().map(|f| f.film().title.clone()).collect();
    assert_eq!(titles, ["Alien"]);

    let nav = store.navigation().await.unwrap();
    assert_eq!(nav[0].label, "All");
    assert_eq!(nav.len(), 5);
}

#[tokio::test]
async fn deleting_a_fresh_film_under_a_filter_keeps_hidden_films() {
    let app = TestApp::new().await;
    app.user("john").await;
    let store = logged_in_store(&app, "john").await;

    store.add_film(FilmDraft { favorite: true, ..draft("Liked") });
    store.settle().await;
    store.add_film(draft("Hidden"));
    store.settle().await;
    store.set_filter(Some("favorites"));
    store.sync().await.unwrap();
    assert_eq!(store.films().len(), 1);

    let provisional = store.add_film(draft("Fresh"));
    store.delete_film(provisional);
    store.settle().await;

    let all = store.api().list_films(None).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, ["Liked", "Hidden", "Fresh"]);
    for film in &all {
        assert_eq!(store.api().get_film(film.id).await.unwrap(), *film);
    }
}

#[tokio::test]
async fn session_survives_in_the_cookie_store() {
    let app = TestApp::new().await;
    let john = app.user("john").await;
    let store = logged_in_store(&app, "john").await;

    let user = store.api().current_user().await.unwrap();
    assert_eq!(user.id, john.id);

    store.logout().await.unwrap();
    assert!(store.films().is_empty());
    assert!(store.restore_session().await.unwrap().is_none());
}

#[tokio::test]
async fn wrong_password_leaves_the_view_anonymous() {
    let app = TestApp::new().await;
    app.user("john").await;
    let base = serve(&app).await;
    let store = OptimisticStore::new(HttpFilmApi::new(base).unwrap());

    let err = store
        .login(&Credentials { username: "john".to_string(), password: "nope".to_string() })
        .await
        .unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(store.take_notice().as_deref(), Some("Wrong username or password"));
    assert_eq!(store.snapshot().owner(), None);
}
