//! Headless client for the films API.
//!
//! [`OptimisticStore`] keeps an eagerly updated local copy of the film list and reconciles
//! it with the server by refetching the whole listing; [`LibraryView`] is the pure state it
//! drives and [`FilmApi`] the transport it talks through.

mod api;
mod store;
mod view;

pub use api::{ApiError, ApiResult, FilmApi, HttpFilmApi};
pub use store::{DEFAULT_RESYNC_DELAY, OptimisticStore};
pub use view::{FetchTicket, FilmView, LibraryView, Status};
