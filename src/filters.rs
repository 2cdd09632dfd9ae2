use jiff::{Span, civil::Date};
use serde::{Deserialize, Serialize};

use crate::models::{Film, RATING_MAX};

pub type Predicate = fn(&Film, Date) -> bool;

/// A named, server-evaluated predicate over a film.
#[derive(Clone, Copy)]
pub struct FilterDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    /// Older route keys that still resolve to this filter.
    pub aliases: &'static [&'static str],
    pub predicate: Predicate,
}

impl FilterDescriptor {
    pub fn matches(&self, film: &Film, today: Date) -> bool {
        (self.predicate)(film, today)
    }

    pub fn link(&self) -> FilterLink {
        FilterLink {
            key: self.key.to_string(),
            label: self.label.to_string(),
            url: format!("/filter/{}", self.key),
        }
    }
}

/// What a client gets to know about a filter: enough to render navigation, never the predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLink {
    pub key: String,
    pub label: String,
    pub url: String,
}

pub static FILTERS: &[FilterDescriptor] = &[
    FilterDescriptor {
        key: "favorites",
        label: "Favorites",
        aliases: &["filter-favorite"],
        predicate: |film, _| film.favorite,
    },
    FilterDescriptor {
        key: "best-rated",
        label: "Best Rated",
        aliases: &["filter-best"],
        predicate: |film, _| i64::from(film.rating) >= RATING_MAX,
    },
    FilterDescriptor {
        key: "seen-last-month",
        label: "Seen Last Month",
        aliases: &["filter-lastmonth"],
        predicate: |film, today| film.watch_date.is_some_and(|d| in_previous_month(d, today)),
    },
    FilterDescriptor {
        key: "unseen",
        label: "Unseen",
        aliases: &["filter-unseen"],
        predicate: |film, _| film.watch_date.is_none(),
    },
];

#[derive(Clone, Copy)]
pub struct FilterCatalog {
    filters: &'static [FilterDescriptor],
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::new(FILTERS)
    }
}

impl FilterCatalog {
    pub fn new(filters: &'static [FilterDescriptor]) -> Self {
        Self { filters }
    }

    /// Unknown keys resolve to `None`; callers treat that as "no filter".
    pub fn lookup(&self, key: &str) -> Option<&'static FilterDescriptor> {
        self.filters.iter().find(|f| f.key == key || f.aliases.contains(&key))
    }

    pub fn links(&self) -> Vec<FilterLink> {
        self.filters.iter().map(FilterDescriptor::link).collect()
    }
}

/// True when `date` falls inside the whole calendar month before the one containing `today`.
pub fn in_previous_month(date: Date, today: Date) -> bool {
    let this_month = today.first_of_month();
    let last_month = this_month.saturating_sub(Span::new().months(1));
    date >= last_month && date < this_month
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn film(favorite: bool, rating: i32, watch_date: Option<Date>) -> Film {
        Film { id: 1, title: "Test".into(), favorite, watch_date, rating, owner: 1 }
    }

    fn matches(key: &str, film: &Film, today: Date) -> bool {
        FilterCatalog::default().lookup(key).unwrap().matches(film, today)
    }

    #[test]
    fn previous_month_is_a_calendar_month_not_thirty_days() {
        let today = date(2026, 10, 17);
        assert!(in_previous_month(date(2026, 9, 1), today));
        assert!(in_previous_month(date(2026, 9, 30), today));
        assert!(!in_previous_month(date(2026, 8, 31), today));
        assert!(!in_previous_month(date(2026, 10, 1), today));
        // Within 30 days but in the current month.
        assert!(!in_previous_month(date(2026, 10, 10), today));
    }

    #[test]
    fn previous_month_wraps_the_year() {
        let today = date(2027, 1, 5);
        assert!(in_previous_month(date(2026, 12, 1), today));
        assert!(in_previous_month(date(2026, 12, 31), today));
        assert!(!in_previous_month(date(2026, 11, 30), today));
    }

    #[test]
    fn previous_month_handles_short_months() {
        let today = date(2024, 3, 31);
        assert!(in_previous_month(date(2024, 2, 29), today));
        assert!(!in_previous_month(date(2024, 3, 1), today));
    }

    #[test]
    fn dune_is_best_rated_and_unseen_only() {
        let today = date(2026, 10, 17);
        let dune = film(true, 5, None);
        assert!(matches("best-rated", &dune, today));
        assert!(matches("unseen", &dune, today));
        assert!(matches("favorites", &dune, today));
        assert!(!matches("seen-last-month", &dune, today));
    }

    #[test]
    fn unseen_and_seen_last_month_are_exclusive() {
        let today = date(2026, 10, 17);
        let dates = [None, Some(date(2026, 9, 15)), Some(date(2026, 10, 2)), Some(date(2020, 1, 1))];
        for watch_date in dates {
            let f = film(false, 3, watch_date);
            assert!(!(matches("unseen", &f, today) && matches("seen-last-month", &f, today)));
        }
    }

    #[test]
    fn legacy_route_keys_resolve() {
        let catalog = FilterCatalog::default();
        assert_eq!(catalog.lookup("filter-best").unwrap().key, "best-rated");
        assert_eq!(catalog.lookup("filter-lastmonth").unwrap().key, "seen-last-month");
        assert!(catalog.lookup("constructor").is_none());
        assert!(catalog.lookup("").is_none());
    }

    #[test]
    fn links_carry_no_predicate() {
        let links = FilterCatalog::default().links();
        assert_eq!(links.len(), FILTERS.len());
        assert_eq!(links[0].url, "/filter/favorites");
    }
}
