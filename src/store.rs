use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    entities::film,
    error::AppResult,
    models::{Film, FilmDraft},
};

/// Narrow CRUD access to the films table.
///
/// Every query except [`RecordStore::find`] is scoped by owner in SQL, so a foreign row can
/// never be read or touched through the owner-scoped methods.
#[derive(Clone)]
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn all_for_owner(&self, owner: i32) -> AppResult<Vec<Film>> {
        let rows = film::Entity::find()
            .filter(film::Column::Owner.eq(owner))
            .order_by_asc(film::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Film::from_row).collect())
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<Film>> {
        let row = film::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(Film::from_row))
    }

    pub async fn insert(&self, owner: i32, draft: &FilmDraft) -> AppResult<Film> {
        let row = draft.to_row(owner).insert(&self.db).await?;
        Ok(Film::from_row(row))
    }

    /// Returns the number of rows changed: 0 when `id` does not exist or belongs to someone else.
    pub async fn update_owned(&self, id: i32, owner: i32, draft: &FilmDraft) -> AppResult<u64> {
        let mut row = draft.to_row(owner);
        // Owner is immutable; only the mutable columns go into the SET clause.
        row.owner = sea_orm::ActiveValue::NotSet;

        let result = film::Entity::update_many()
            .set(row)
            .filter(film::Column::Id.eq(id))
            .filter(film::Column::Owner.eq(owner))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn update_favorite_owned(&self, id: i32, owner: i32, favorite: bool) -> AppResult<u64> {
        let row = film::ActiveModel { favorite: Set(favorite), ..Default::default() };
        let result = film::Entity::update_many()
            .set(row)
            .filter(film::Column::Id.eq(id))
            .filter(film::Column::Owner.eq(owner))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn update_rating_owned(&self, id: i32, owner: i32, rating: i32) -> AppResult<u64> {
        let row = film::ActiveModel { rating: Set(rating), ..Default::default() };
        let result = film::Entity::update_many()
            .set(row)
            .filter(film::Column::Id.eq(id))
            .filter(film::Column::Owner.eq(owner))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_owned(&self, id: i32, owner: i32) -> AppResult<u64> {
        let result = film::Entity::delete_many()
            .filter(film::Column::Id.eq(id))
            .filter(film::Column::Owner.eq(owner))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
