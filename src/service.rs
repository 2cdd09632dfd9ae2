use jiff::civil::Date;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    filters::FilterCatalog,
    models::{Film, FilmDraft, validate_rating},
    store::RecordStore,
};

/// Authoritative film operations, always scoped to the caller's identity.
///
/// Update against a missing or foreign id is `NotFound` (zero matched rows is never reported
/// as success); delete of the same is a silent no-op so that deletes stay idempotent.
#[derive(Clone)]
pub struct FilmService {
    store: RecordStore,
    catalog: FilterCatalog,
}

impl FilmService {
    pub fn new(store: RecordStore, catalog: FilterCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub async fn list(&self, owner: Option<i32>, filter: Option<&str>) -> AppResult<Vec<Film>> {
        let today: Date = jiff::Zoned::now().date();
        self.list_as_of(owner, filter, today).await
    }

    pub async fn list_as_of(
        &self,
        owner: Option<i32>,
        filter: Option<&str>,
        today: Date,
    ) -> AppResult<Vec<Film>> {
        // An anonymous caller owns nothing.
        let Some(owner) = owner else {
            return Ok(Vec::new());
        };

        let films = self.store.all_for_owner(owner).await?;

        let Some(descriptor) = filter.and_then(|key| self.catalog.lookup(key)) else {
            debug!(owner, filter = ?filter, count = films.len(), "listing films unfiltered");
            return Ok(films);
        };

        let films: Vec<Film> = films.into_iter().filter(|f| descriptor.matches(f, today)).collect();
        debug!(owner, filter = descriptor.key, count = films.len(), "listing films");
        Ok(films)
    }

    pub async fn get(&self, id: i32) -> AppResult<Film> {
        self.store.find(id).await?.ok_or_else(|| AppError::film_not_found(id))
    }

    pub async fn create(&self, owner: i32, draft: FilmDraft) -> AppResult<Film> {
        let film = self.store.insert(owner, &draft).await?;
        info!(owner, film_id = film.id, "film created");
        Ok(film)
    }

    pub async fn update(&self, id: i32, owner: i32, draft: FilmDraft) -> AppResult<Film> {
        let changed = self.store.update_owned(id, owner, &draft).await?;
        if changed == 0 {
            debug!(owner, film_id = id, "update matched no owned film");
            return Err(AppError::film_not_found(id));
        }
        info!(owner, film_id = id, "film updated");
        Ok(draft.into_film(id, owner))
    }

    pub async fn set_favorite(&self, id: i32, owner: i32, favorite: bool) -> AppResult<Film> {
        let changed = self.store.update_favorite_owned(id, owner, favorite).await?;
        self.reload_owned(id, owner, changed).await
    }

    pub async fn set_rating(&self, id: i32, owner: i32, rating: i64) -> AppResult<Film> {
        let rating = validate_rating(rating).map_err(AppError::Validation)?;
        let changed = self.store.update_rating_owned(id, owner, rating).await?;
        self.reload_owned(id, owner, changed).await
    }

    pub async fn delete(&self, id: i32, owner: i32) -> AppResult<()> {
        let removed = self.store.delete_owned(id, owner).await?;
        if removed == 0 {
            debug!(owner, film_id = id, "delete matched no owned film");
        } else {
            info!(owner, film_id = id, "film deleted");
        }
        Ok(())
    }

    async fn reload_owned(&self, id: i32, owner: i32, changed: u64) -> AppResult<Film> {
        if changed == 0 {
            return Err(AppError::film_not_found(id));
        }
        self.store
            .find(id)
            .await?
            .filter(|f| f.owner == owner)
            .ok_or_else(|| AppError::film_not_found(id))
    }
}
