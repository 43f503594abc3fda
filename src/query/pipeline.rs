//! Single entry points combining filters, sorting and aggregation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, Weekday};

use super::QueryError;
use super::aggregate::{self, CategoryCount, CategoryShare, CityCount, DayCount, Memory, Overview};
use super::filter::{
    DateFilter, SearchScope, matches_date_filter, matches_favorite, matches_search,
    normalize_token,
};
use super::sort::{SortOption, sort_notes};
use crate::models::Note;

/// Trailing window used by the activity chart when none is given.
pub const DEFAULT_ACTIVITY_DAYS: u32 = 30;

/// Active search, filter and sort parameters for one rendering of a note list.
///
/// # Examples
///
/// ```
/// use geonote::query::{DateFilter, QuerySpec, SortOption};
///
/// let spec = QuerySpec {
///     search: "paris".to_string(),
///     date_filter: DateFilter::ThisMonth,
///     sort: SortOption::TitleAz,
///     ..Default::default()
/// };
/// assert!(!spec.favorites_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    /// Case-insensitive substring to look for. Blank matches everything.
    pub search: String,
    pub search_scope: SearchScope,
    pub favorites_only: bool,
    pub date_filter: DateFilter,
    pub sort: SortOption,
    /// First day of the week for [`DateFilter::ThisWeek`].
    pub week_start: Weekday,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            search_scope: SearchScope::default(),
            favorites_only: false,
            date_filter: DateFilter::default(),
            sort: SortOption::default(),
            week_start: Weekday::Monday,
        }
    }
}

impl QuerySpec {
    /// True if `note` passes every filter of this query.
    pub fn matches(&self, note: &Note, now: OffsetDateTime) -> bool {
        matches_search(note, &self.search, self.search_scope)
            && matches_date_filter(note, self.date_filter, now, self.week_start)
            && matches_favorite(note, self.favorites_only)
    }
}

/// Filters and sorts `notes` according to `spec`.
///
/// Filtering keeps input order and sorting never drops notes. The input is
/// left untouched; the result borrows from it. `now` fixes the local calendar
/// for date filters and must be held constant for a single query.
pub fn execute<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    spec: &QuerySpec,
    now: OffsetDateTime,
) -> Vec<&'a Note> {
    let mut selected: Vec<&Note> = notes
        .into_iter()
        .filter(|n| matches_search(n, &spec.search, spec.search_scope))
        .filter(|n| matches_date_filter(n, spec.date_filter, now, spec.week_start))
        .filter(|n| matches_favorite(n, spec.favorites_only))
        .collect();

    sort_notes(&mut selected, spec.sort);

    tracing::debug!(
        matched = selected.len(),
        sort = %spec.sort,
        date_filter = %spec.date_filter,
        "executed note query"
    );
    selected
}

/// Which summary [`aggregate`] should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    CityCounts,
    CategoryCounts,
    CategoryShares,
    DailyActivity { days: u32 },
    TopCity,
    OnThisDay,
    Overview,
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CityCounts => f.write_str("city_counts"),
            Self::CategoryCounts => f.write_str("category_counts"),
            Self::CategoryShares => f.write_str("category_shares"),
            Self::DailyActivity { days } => write!(f, "daily_activity:{days}"),
            Self::TopCity => f.write_str("top_city"),
            Self::OnThisDay => f.write_str("on_this_day"),
            Self::Overview => f.write_str("overview"),
        }
    }
}

impl FromStr for AggregationKind {
    type Err = QueryError;

    /// Parses tokens such as `cities`, `top-city` or `activity:14`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || QueryError::UnknownAggregation(s.to_string());
        let token = normalize_token(s);
        let (name, arg) = match token.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (token.as_str(), None),
        };

        let kind = match (name, arg) {
            ("cities" | "city_counts", None) => Self::CityCounts,
            ("categories" | "category_counts", None) => Self::CategoryCounts,
            ("shares" | "category_shares", None) => Self::CategoryShares,
            ("activity" | "daily_activity", None) => Self::DailyActivity {
                days: DEFAULT_ACTIVITY_DAYS,
            },
            ("activity" | "daily_activity", Some(days)) => Self::DailyActivity {
                days: days.parse().map_err(|_| unknown())?,
            },
            ("top_city", None) => Self::TopCity,
            ("memory" | "on_this_day", None) => Self::OnThisDay,
            ("overview", None) => Self::Overview,
            _ => return Err(unknown()),
        };
        Ok(kind)
    }
}

/// Result of [`aggregate`], one variant per [`AggregationKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Summary<'a> {
    CityCounts(Vec<CityCount>),
    CategoryCounts(Vec<CategoryCount>),
    CategoryShares(Vec<CategoryShare>),
    DailyActivity(Vec<DayCount>),
    TopCity(Option<CityCount>),
    OnThisDay(Option<Memory<'a>>),
    Overview(Overview),
}

/// Reduces `notes` to the summary named by `kind`.
pub fn aggregate<'a>(notes: &'a [Note], kind: AggregationKind, now: OffsetDateTime) -> Summary<'a> {
    tracing::debug!(notes = notes.len(), %kind, "aggregating notes");

    match kind {
        AggregationKind::CityCounts => Summary::CityCounts(aggregate::city_counts(notes)),
        AggregationKind::CategoryCounts => {
            Summary::CategoryCounts(aggregate::category_counts(notes))
        }
        AggregationKind::CategoryShares => {
            Summary::CategoryShares(aggregate::category_shares(notes))
        }
        AggregationKind::DailyActivity { days } => {
            Summary::DailyActivity(aggregate::daily_activity(notes, days, now))
        }
        AggregationKind::TopCity => Summary::TopCity(aggregate::top_city(notes)),
        AggregationKind::OnThisDay => Summary::OnThisDay(aggregate::on_this_day(notes, now)),
        AggregationKind::Overview => Summary::Overview(aggregate::overview(notes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, NoteBuilder, NoteId};
    use std::collections::BTreeSet;
    use time::Duration;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-15 10:00 UTC);

    fn note(id: i64, title: &str, city: &str, favorite: bool, at: OffsetDateTime) -> Note {
        NoteBuilder::new()
            .id(NoteId::new(id))
            .user_id("alice")
            .title(title)
            .location(Location::at(0.0, 0.0).in_city(city, "Country"))
            .favorite(favorite)
            .timestamp(at)
            .build()
    }

    fn sample() -> Vec<Note> {
        vec![
            note(1, "Croissant", "Paris", true, datetime!(2024-06-15 08:00 UTC)),
            note(2, "Museum", "Paris", false, datetime!(2024-06-14 08:00 UTC)),
            note(3, "Forum", "Rome", false, datetime!(2024-05-01 08:00 UTC)),
            note(4, "Fjord", "Bergen", true, datetime!(2023-12-31 08:00 UTC)),
        ]
    }

    fn ids(notes: &[&Note]) -> Vec<i64> {
        notes.iter().map(|n| n.id().get()).collect()
    }

    #[test]
    fn default_spec_returns_everything_newest_first() {
        let notes = sample();
        let result = execute(&notes, &QuerySpec::default(), NOW);
        assert_eq!(ids(&result), [1, 2, 3, 4]);
    }

    #[test]
    fn filters_combine_before_sorting() {
        let notes = sample();
        let spec = QuerySpec {
            search: "PAR".to_string(),
            favorites_only: true,
            date_filter: DateFilter::ThisYear,
            sort: SortOption::TitleAz,
            ..Default::default()
        };

        assert_eq!(ids(&execute(&notes, &spec, NOW)), [1]);
    }

    #[test]
    fn unmatched_search_returns_empty() {
        let notes = sample();
        let spec = QuerySpec {
            search: "xyz".to_string(),
            ..Default::default()
        };
        assert!(execute(&notes, &spec, NOW).is_empty());
    }

    #[test]
    fn filter_order_does_not_change_the_result_set() {
        let notes = sample();
        let spec = QuerySpec {
            search: "o".to_string(),
            favorites_only: false,
            date_filter: DateFilter::ThisMonth,
            ..Default::default()
        };

        let via_pipeline: BTreeSet<i64> = execute(&notes, &spec, NOW)
            .iter()
            .map(|n| n.id().get())
            .collect();

        let reversed: BTreeSet<i64> = notes
            .iter()
            .filter(|n| matches_favorite(n, spec.favorites_only))
            .filter(|n| matches_date_filter(n, spec.date_filter, NOW, spec.week_start))
            .filter(|n| matches_search(n, &spec.search, spec.search_scope))
            .map(|n| n.id().get())
            .collect();

        assert_eq!(via_pipeline, reversed);
        assert!(notes.iter().filter(|n| spec.matches(n, NOW)).count() == reversed.len());
    }

    #[test]
    fn execute_is_idempotent_on_its_own_output() {
        let notes = sample();
        for sort in [
            SortOption::DateNewest,
            SortOption::DateOldest,
            SortOption::TitleAz,
            SortOption::TitleZa,
            SortOption::FavoritesFirst,
        ] {
            let spec = QuerySpec {
                sort,
                ..Default::default()
            };
            let once: Vec<Note> = execute(&notes, &spec, NOW).into_iter().cloned().collect();
            let twice: Vec<Note> = execute(&once, &spec, NOW).into_iter().cloned().collect();
            assert_eq!(once, twice, "sort {sort} is not idempotent");
        }
    }

    #[test]
    fn execute_does_not_mutate_input() {
        let notes = sample();
        let before = notes.clone();
        let spec = QuerySpec {
            sort: SortOption::TitleZa,
            ..Default::default()
        };
        let _ = execute(&notes, &spec, NOW);
        assert_eq!(notes, before);
    }

    #[test]
    fn favorites_first_keeps_relative_order() {
        let base = datetime!(2024-06-01 00:00 UTC);
        let notes = vec![
            note(1, "a", "Paris", true, base),
            note(2, "b", "Paris", false, base + Duration::hours(1)),
            note(3, "c", "Rome", false, base + Duration::hours(2)),
        ];
        let spec = QuerySpec {
            sort: SortOption::FavoritesFirst,
            ..Default::default()
        };
        assert_eq!(ids(&execute(&notes, &spec, NOW)), [1, 2, 3]);
    }

    #[test]
    fn aggregate_dispatches_by_kind() {
        let notes = sample();

        match aggregate(&notes, AggregationKind::TopCity, NOW) {
            Summary::TopCity(Some(top)) => assert_eq!((top.city.as_str(), top.count), ("Paris", 2)),
            other => panic!("unexpected summary: {other:?}"),
        }

        match aggregate(&notes, AggregationKind::DailyActivity { days: 7 }, NOW) {
            Summary::DailyActivity(days) => assert_eq!(days.len(), 7),
            other => panic!("unexpected summary: {other:?}"),
        }
    }

    #[test]
    fn aggregate_of_empty_collection_never_fails() {
        for kind in [
            AggregationKind::CityCounts,
            AggregationKind::CategoryCounts,
            AggregationKind::CategoryShares,
            AggregationKind::TopCity,
            AggregationKind::OnThisDay,
            AggregationKind::Overview,
        ] {
            let summary = aggregate(&[], kind, NOW);
            let empty = match summary {
                Summary::CityCounts(v) => v.is_empty(),
                Summary::CategoryCounts(v) => v.is_empty(),
                Summary::CategoryShares(v) => v.is_empty(),
                Summary::TopCity(top) => top.is_none(),
                Summary::OnThisDay(memory) => memory.is_none(),
                Summary::Overview(o) => o == Overview::default(),
                Summary::DailyActivity(_) => false,
            };
            assert!(empty, "{kind} should be empty");
        }
    }

    #[test]
    fn aggregation_kind_parses_with_optional_window() {
        assert_eq!(
            "activity".parse::<AggregationKind>().unwrap(),
            AggregationKind::DailyActivity { days: 30 }
        );
        assert_eq!(
            "activity:14".parse::<AggregationKind>().unwrap(),
            AggregationKind::DailyActivity { days: 14 }
        );
        assert_eq!("top-city".parse::<AggregationKind>().unwrap(), AggregationKind::TopCity);
        assert_eq!(
            "cities:3".parse::<AggregationKind>(),
            Err(QueryError::UnknownAggregation("cities:3".to_string()))
        );
        assert!("activity:many".parse::<AggregationKind>().is_err());
    }

    #[test]
    fn query_spec_rejects_unknown_sort_in_json() {
        let ok: QuerySpec = serde_json::from_str(r#"{"sort":"title_za","search":"x"}"#).unwrap();
        assert_eq!(ok.sort, SortOption::TitleZa);
        assert_eq!(ok.date_filter, DateFilter::All);

        let bad = serde_json::from_str::<QuerySpec>(r#"{"sort":"shuffle"}"#);
        assert!(bad.is_err());
    }
}
