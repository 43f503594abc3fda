//! Notes query and aggregation engine.
//!
//! Pure functions over in-memory note snapshots: predicate filters, stable
//! sort strategies, group-by aggregators and the pipeline tying them together.
//! Nothing here performs I/O or reads the clock; date-relative operations take
//! `now` explicitly and use its UTC offset as the local calendar.

pub mod aggregate;
mod error;
pub mod filter;
pub mod pipeline;
pub mod sort;

pub use aggregate::{
    CategoryCount, CategoryShare, CityCount, DayCount, Memory, Overview, category_counts,
    category_shares, city_counts, daily_activity, favorites, notes_in_city, on_this_day, overview,
    percentage, photo_gallery, recent_notes, top_city,
};
pub use error::QueryError;
pub use filter::{
    DateFilter, SearchScope, matches_city, matches_date_filter, matches_favorite, matches_search,
    parse_weekday,
};
pub use pipeline::{AggregationKind, DEFAULT_ACTIVITY_DAYS, QuerySpec, Summary, aggregate, execute};
pub use sort::{SortOption, sort_notes};
