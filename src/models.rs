use std::fmt;

use jiff::civil::Date;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::{
    entities::{film, user},
    error::AppError,
};

pub const TITLE_MAX_CHARS: usize = 160;
pub const RATING_MAX: i64 = 5;

/// A film as the API exposes it.
///
/// Storage keeps the watch date in a snake_case `watch_date` column; the wire name is
/// always `watchDate`. [`Film::from_row`] and [`FilmDraft::to_row`] are the only places
/// that translate between the two.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub id: i32,
    pub title: String,
    pub favorite: bool,
    #[serde(rename = "watchDate", default)]
    pub watch_date: Option<Date>,
    pub rating: i32,
    pub owner: i32,
}

impl Film {
    pub fn from_row(row: film::Model) -> Self {
        let watch_date = row.watch_date.as_deref().and_then(|raw| match raw.parse::<Date>() {
            Ok(date) => Some(date),
            Err(err) => {
                tracing::warn!(film_id = row.id, raw = %raw, error = %err, "unparseable stored watch date");
                None
            },
        });

        Self {
            id: row.id,
            title: row.title,
            favorite: row.favorite,
            watch_date,
            rating: row.rating,
            owner: row.owner,
        }
    }
}

/// Validated film fields, without the server-owned `id` and `owner`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmDraft {
    pub title: String,
    pub favorite: bool,
    #[serde(rename = "watchDate", default)]
    pub watch_date: Option<Date>,
    pub rating: i32,
}

impl FilmDraft {
    pub fn to_row(&self, owner: i32) -> film::ActiveModel {
        film::ActiveModel {
            id: NotSet,
            title: Set(self.title.clone()),
            favorite: Set(self.favorite),
            watch_date: Set(self.watch_date.map(|d| d.to_string())),
            rating: Set(self.rating),
            owner: Set(owner),
        }
    }

    pub fn into_film(self, id: i32, owner: i32) -> Film {
        Film {
            id,
            title: self.title,
            favorite: self.favorite,
            watch_date: self.watch_date,
            rating: self.rating,
            owner,
        }
    }
}

/// Film body as received on `POST`/`PUT`, before validation.
///
/// Types are deliberately loose (`i64` rating, string date) so that out-of-range values
/// are reported by [`FilmPayload::validate`] rather than by the JSON decoder. A caller
/// supplied `owner` is not even read.
#[derive(Debug, Default, Deserialize)]
pub struct FilmPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub favorite: bool,
    #[serde(rename = "watchDate", default)]
    pub watch_date: Option<String>,
    pub rating: i64,
}

impl FilmPayload {
    pub fn validate(self) -> Result<FilmDraft, AppError> {
        let mut problems = Vec::new();

        let title_len = self.title.chars().count();
        if title_len == 0 || title_len > TITLE_MAX_CHARS {
            problems.push(format!("title must be between 1 and {TITLE_MAX_CHARS} characters"));
        }

        let watch_date = parse_watch_date(self.watch_date.as_deref()).unwrap_or_else(|msg| {
            problems.push(msg);
            None
        });

        let rating = validate_rating(self.rating).unwrap_or_else(|msg| {
            problems.push(msg);
            0
        });

        if !problems.is_empty() {
            return Err(AppError::Validation(problems.join(", ")));
        }

        Ok(FilmDraft { title: self.title, favorite: self.favorite, watch_date, rating })
    }
}

#[derive(Debug, Deserialize)]
pub struct FavoritePatch {
    pub id: i64,
    pub favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct RatingPatch {
    pub id: i64,
    pub rating: i64,
}

/// `None` and the empty string both mean "unseen".
pub fn parse_watch_date(raw: Option<&str>) -> Result<Option<Date>, String> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("watchDate must be a YYYY-MM-DD date".to_string());
    }

    raw.parse::<Date>()
        .map(Some)
        .map_err(|_| format!("watchDate {raw} is not a valid calendar date"))
}

pub fn validate_rating(rating: i64) -> Result<i32, String> {
    if (0..=RATING_MAX).contains(&rating) {
        Ok(rating as i32)
    } else {
        Err(format!("rating must be an integer between 0 and {RATING_MAX}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub name: String,
}

impl From<user::Model> for User {
    fn from(row: user::Model) -> Self {
        Self { id: row.id, username: row.username, name: row.name }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
