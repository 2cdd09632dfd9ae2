use crate::models::{Film, FilmDraft};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Confirmed,
    Added,
    Updated,
    Deleted,
}

/// A film in the local list, tagged with how far it is from the server's word on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilmView {
    Confirmed(Film),
    Added(Film),
    Updated(Film),
    Deleted(Film),
}

impl FilmView {
    pub fn film(&self) -> &Film {
        match self {
            FilmView::Confirmed(f) | FilmView::Added(f) | FilmView::Updated(f) | FilmView::Deleted(f) => f,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            FilmView::Confirmed(_) => Status::Confirmed,
            FilmView::Added(_) => Status::Added,
            FilmView::Updated(_) => Status::Updated,
            FilmView::Deleted(_) => Status::Deleted,
        }
    }

    pub fn id(&self) -> i32 {
        self.film().id
    }
}

/// Identifies one authoritative listing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub filter: Option<String>,
    pub owner: Option<i32>,
    revision: u64,
}

/// Client-side mirror of the film list.
///
/// Local mutations apply immediately and tag the item. Any server response marks the view
/// dirty; the next fetch replaces the whole list. `revision` counts dirty marks so that a
/// response landing while a fetch is in flight keeps the view dirty after that fetch.
#[derive(Clone, Debug)]
pub struct LibraryView {
    films: Vec<FilmView>,
    filter: Option<String>,
    owner: Option<i32>,
    dirty: bool,
    next_id: i32,
    latest_seq: u64,
    revision: u64,
    notice: Option<String>,
}

impl Default for LibraryView {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryView {
    pub fn new() -> Self {
        Self {
            films: Vec::new(),
            filter: None,
            owner: None,
            dirty: true,
            next_id: 1,
            latest_seq: 0,
            revision: 0,
            notice: None,
        }
    }

    pub fn films(&self) -> &[FilmView] {
        &self.films
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn owner(&self) -> Option<i32> {
        self.owner
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn find(&self, id: i32) -> Option<&FilmView> {
        self.films.iter().find(|f| f.id() == id)
    }

    /// Always above every id currently in the list, and never handed out twice.
    fn provisional_id(&self) -> i32 {
        let above_known = self.films.iter().map(FilmView::id).max().map_or(1, |max| max + 1);
        above_known.max(self.next_id)
    }

    pub fn add(&mut self, draft: FilmDraft) -> i32 {
        let id = self.provisional_id();
        self.next_id = id + 1;
        let owner = self.owner.unwrap_or_default();
        self.films.push(FilmView::Added(draft.into_film(id, owner)));
        id
    }

    /// Records an id the server assigned, so later provisional ids stay above it.
    pub fn note_server_id(&mut self, id: i32) {
        self.next_id = self.next_id.max(id + 1);
    }

    /// Replaces the film in place and returns its previous status. An `Added` film has no
    /// server record yet, so it stays `Added`.
    pub fn update(&mut self, film: Film) -> Option<Status> {
        let slot = self.films.iter_mut().find(|f| f.id() == film.id)?;
        let previous = slot.status();
        *slot = match previous {
            Status::Added => FilmView::Added(film),
            _ => FilmView::Updated(film),
        };
        Some(previous)
    }

    /// Flags the film as deleted and returns its previous status.
    pub fn delete(&mut self, id: i32) -> Option<Status> {
        let slot = self.films.iter_mut().find(|f| f.id() == id)?;
        let previous = slot.status();
        *slot = FilmView::Deleted(slot.film().clone());
        Some(previous)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    pub fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.mark_dirty();
    }

    pub fn sign_in(&mut self, owner: i32) {
        self.owner = Some(owner);
        self.mark_dirty();
    }

    /// Also invalidates any fetch still in flight for the previous user.
    pub fn sign_out(&mut self) {
        self.owner = None;
        self.films.clear();
        self.filter = None;
        self.dirty = false;
        self.latest_seq += 1;
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Starts a fetch if the view is dirty. Issuing a ticket invalidates every earlier one.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.dirty {
            return None;
        }
        self.latest_seq += 1;
        Some(FetchTicket {
            seq: self.latest_seq,
            filter: self.filter.clone(),
            owner: self.owner,
            revision: self.revision,
        })
    }

    /// Whether a response for `ticket` may still be applied.
    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.latest_seq && ticket.filter == self.filter && ticket.owner == self.owner
    }

    /// Replaces the whole list with the server's listing. No merge with provisional items is
    /// attempted. A superseded ticket leaves the view untouched.
    pub fn reconcile(mut self, ticket: &FetchTicket, films: Vec<Film>) -> Self {
        if !self.accepts(ticket) {
            return self;
        }

        if let Some(max) = films.iter().map(|f| f.id).max() {
            self.next_id = self.next_id.max(max + 1);
        }
        self.films = films.into_iter().map(FilmView::Confirmed).collect();
        self.dirty = self.revision != ticket.revision;
        self
    }
}
