use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, warn};

use super::{
    api::{ApiError, ApiResult, FilmApi},
    view::{FilmView, LibraryView, Status},
};
use crate::{
    filters::FilterLink,
    models::{Credentials, Film, FilmDraft, User},
};

/// How long a failed request waits before forcing a resync.
pub const DEFAULT_RESYNC_DELAY: Duration = Duration::from_secs(2);

/// Drives a [`LibraryView`] against a [`FilmApi`].
///
/// Mutations update the view synchronously and fire their request in the background. Every
/// response, good or bad, ends with the view marked dirty, and [`OptimisticStore::sync`]
/// (or the [`OptimisticStore::run`] loop) refetches the whole list.
pub struct OptimisticStore<A> {
    api: Arc<A>,
    view: Arc<Mutex<LibraryView>>,
    changed: Arc<Notify>,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
    resync_delay: Duration,
}

impl<A> Clone for OptimisticStore<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            view: self.view.clone(),
            changed: self.changed.clone(),
            in_flight: self.in_flight.clone(),
            resync_delay: self.resync_delay,
        }
    }
}

impl<A: FilmApi> OptimisticStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            view: Arc::new(Mutex::new(LibraryView::new())),
            changed: Arc::new(Notify::new()),
            in_flight: Arc::new(Mutex::new(Vec::new())),
            resync_delay: DEFAULT_RESYNC_DELAY,
        }
    }

    pub fn with_resync_delay(mut self, delay: Duration) -> Self {
        self.resync_delay = delay;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn films(&self) -> Vec<FilmView> {
        self.lock().films().to_vec()
    }

    pub fn snapshot(&self) -> LibraryView {
        self.lock().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    pub fn take_notice(&self) -> Option<String> {
        self.lock().take_notice()
    }

    /// Returns the provisional id the new film is shown under until the next sync.
    pub fn add_film(&self, draft: FilmDraft) -> i32 {
        let id = self.lock().add(draft.clone());
        debug!(provisional_id = id, "film added locally");
        let view = self.view.clone();
        self.dispatch("create", move |api| async move {
            let film = api.create_film(&draft).await?;
            view.lock().unwrap_or_else(PoisonError::into_inner).note_server_id(film.id);
            Ok(())
        });
        id
    }

    /// Edits to a film that is still `Added` stay local: its id is a placeholder the server
    /// has never seen. The next listing replaces it either way.
    pub fn update_film(&self, film: Film) {
        let previous = self.lock().update(film.clone());
        if previous == Some(Status::Added) {
            debug!(provisional_id = film.id, "update kept local until the create lands");
            return;
        }
        self.dispatch("update", move |api| async move { api.update_film(&film).await.map(|_| ()) });
    }

    pub fn delete_film(&self, id: i32) {
        let previous = self.lock().delete(id);
        if previous == Some(Status::Added) {
            debug!(provisional_id = id, "delete kept local until the create lands");
            return;
        }
        self.dispatch("delete", move |api| async move { api.delete_film(id).await });
    }

    pub fn set_filter(&self, filter: Option<&str>) {
        self.lock().set_filter(filter.map(str::to_string));
        self.changed.notify_one();
    }

    /// Navigation entries: "All" followed by the server's catalog.
    pub async fn navigation(&self) -> ApiResult<Vec<FilterLink>> {
        let mut links = vec![FilterLink {
            key: "all".to_string(),
            label: "All".to_string(),
            url: String::new(),
        }];
        links.extend(self.api.filters().await?);
        Ok(links)
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        match self.api.login(credentials).await {
            Ok(user) => {
                {
                    let mut view = self.lock();
                    view.sign_in(user.id);
                    view.notify(format!("Welcome, {}", user.name));
                }
                self.changed.notify_one();
                Ok(user)
            },
            Err(err) => {
                self.lock().notify("Wrong username or password");
                Err(err)
            },
        }
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.api.logout().await?;
        self.lock().sign_out();
        Ok(())
    }

    /// Picks up a session that survived a restart. A `401` simply means nobody is logged in.
    pub async fn restore_session(&self) -> ApiResult<Option<User>> {
        match self.api.current_user().await {
            Ok(user) => {
                self.lock().sign_in(user.id);
                self.changed.notify_one();
                Ok(Some(user))
            },
            Err(err) if err.is_unauthenticated() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Refetches the list for the current filter if the view is dirty.
    ///
    /// Returns whether a server listing was applied. A response that was superseded by a
    /// newer fetch or a filter change is dropped.
    pub async fn sync(&self) -> ApiResult<bool> {
        let ticket = self.lock().begin_fetch();
        let Some(ticket) = ticket else {
            return Ok(false);
        };

        let films = match self.api.list_films(ticket.filter.as_deref()).await {
            Ok(films) => films,
            Err(err) => {
                self.lock().notify(err.to_string());
                return Err(err);
            },
        };

        let mut view = self.lock();
        let applied = view.accepts(&ticket);
        let current = std::mem::take(&mut *view);
        *view = current.reconcile(&ticket, films);
        if !applied {
            debug!(seq = ticket.seq, "dropped superseded listing");
        }
        Ok(applied)
    }

    /// Waits for every request fired so far, including the delayed resyncs of failed ones.
    pub async fn settle(&self) {
        loop {
            let pending =
                std::mem::take(&mut *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner));
            if pending.is_empty() {
                break;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(err) = result {
                    warn!(error = %err, "request task failed");
                }
            }
        }
    }

    /// Syncs whenever the view changes. Runs until the task is dropped.
    pub async fn run(self) {
        loop {
            self.changed.notified().await;
            if let Err(err) = self.sync().await {
                warn!(error = %err, "refetch failed, retrying later");
                tokio::time::sleep(self.resync_delay).await;
                self.mark_dirty();
            }
        }
    }

    fn dispatch<F, Fut>(&self, what: &'static str, call: F)
    where
        F: FnOnce(Arc<A>) -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult<()>> + Send + 'static,
    {
        let store = self.clone();
        let handle = tokio::spawn(async move {
            match call(store.api.clone()).await {
                Ok(()) => store.mark_dirty(),
                Err(err) => store.fail(what, err).await,
            }
        });
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    async fn fail(&self, what: &'static str, err: ApiError) {
        warn!(request = what, error = %err, "request rejected");
        self.lock().notify(err.to_string());
        tokio::time::sleep(self.resync_delay).await;
        self.mark_dirty();
    }

    fn mark_dirty(&self) {
        self.lock().mark_dirty();
        self.changed.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, LibraryView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
