//! Predicates deciding whether a single note belongs in a view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, Time, Weekday};

use super::QueryError;
use crate::models::{Note, is_known_city};

/// Which note fields a free-text search looks at.
///
/// The map view searches title, body and city. The all-notes list also
/// searches the country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    Standard,
    IncludeCountry,
}

impl FromStr for SearchScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "standard" => Ok(Self::Standard),
            "include_country" | "country" => Ok(Self::IncludeCountry),
            _ => Err(QueryError::UnknownSearchScope(s.to_string())),
        }
    }
}

/// Lower bound on note creation time, relative to the local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
}

impl DateFilter {
    /// Returns the earliest instant a note may have to pass this filter.
    ///
    /// All bounds are local midnight in `now`'s offset. `None` means unbounded.
    pub fn lower_bound(self, now: OffsetDateTime, week_start: Weekday) -> Option<OffsetDateTime> {
        let today = now.date();
        let first_day = match self {
            Self::All => return None,
            Self::Today => today,
            Self::ThisWeek => start_of_week(today, week_start),
            Self::ThisMonth => today - Duration::days(i64::from(today.day()) - 1),
            Self::ThisYear => today - Duration::days(i64::from(today.ordinal()) - 1),
        };
        Some(local_midnight(first_day, now))
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::All => "all",
            Self::Today => "today",
            Self::ThisWeek => "this_week",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
        };
        f.write_str(label)
    }
}

impl FromStr for DateFilter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" | "this_week" => Ok(Self::ThisWeek),
            "month" | "this_month" => Ok(Self::ThisMonth),
            "year" | "this_year" => Ok(Self::ThisYear),
            _ => Err(QueryError::UnknownDateFilter(s.to_string())),
        }
    }
}

/// True if `query` is blank or occurs, ignoring case, in one of the searched fields.
pub fn matches_search(note: &Note, query: &str, scope: SearchScope) -> bool {
    if query.trim().is_empty() {
        return true;
    }

    let needle = query.to_lowercase();
    let contains = |field: &str| field.to_lowercase().contains(&needle);

    contains(note.title())
        || contains(note.content())
        || contains(note.city())
        || (scope == SearchScope::IncludeCountry && contains(note.country()))
}

pub fn matches_favorite(note: &Note, favorites_only: bool) -> bool {
    !favorites_only || note.is_favorite()
}

/// True if the note was created at or after the filter's lower bound.
pub fn matches_date_filter(
    note: &Note,
    filter: DateFilter,
    now: OffsetDateTime,
    week_start: Weekday,
) -> bool {
    match filter.lower_bound(now, week_start) {
        Some(bound) => note.timestamp() >= bound,
        None => true,
    }
}

/// Exact, case-sensitive city match.
///
/// Notes without a known city never match, whatever `city` is.
pub fn matches_city(note: &Note, city: &str) -> bool {
    is_known_city(note.city()) && note.city() == city
}

/// Calendar date of `instant` in `now`'s offset.
///
/// The offset is fixed, not a time zone: notes written under a different
/// daylight saving offset than `now` can land on the neighbouring date when
/// they fall within that offset difference of midnight.
pub fn local_date(instant: OffsetDateTime, now: OffsetDateTime) -> Date {
    instant.to_offset(now.offset()).date()
}

/// Midnight at the start of `date`, in `now`'s offset.
pub fn local_midnight(date: Date, now: OffsetDateTime) -> OffsetDateTime {
    date.with_time(Time::MIDNIGHT).assume_offset(now.offset())
}

/// First day of the week containing `date`.
pub fn start_of_week(date: Date, week_start: Weekday) -> Date {
    let days_into_week = (7 + date.weekday().number_days_from_monday()
        - week_start.number_days_from_monday())
        % 7;
    date - Duration::days(i64::from(days_into_week))
}

/// Parses an English weekday name or its three-letter abbreviation.
pub fn parse_weekday(s: &str) -> Result<Weekday, QueryError> {
    let weekday = match normalize_token(s).as_str() {
        "monday" | "mon" => Weekday::Monday,
        "tuesday" | "tue" => Weekday::Tuesday,
        "wednesday" | "wed" => Weekday::Wednesday,
        "thursday" | "thu" => Weekday::Thursday,
        "friday" | "fri" => Weekday::Friday,
        "saturday" | "sat" => Weekday::Saturday,
        "sunday" | "sun" => Weekday::Sunday,
        _ => return Err(QueryError::UnknownWeekday(s.to_string())),
    };
    Ok(weekday)
}

/// Lowercases and maps `-` to `_` so `this-week` and `This_Week` parse alike.
pub(crate) fn normalize_token(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, NoteBuilder, UNKNOWN_CITY};
    use time::macros::{date, datetime};

    fn note_in(city: &str, country: &str) -> Note {
        NoteBuilder::new()
            .title("Morning walk")
            .content("Along the river")
            .location(Location::at(0.0, 0.0).in_city(city, country))
            .build()
    }

    fn note_at(at: OffsetDateTime) -> Note {
        NoteBuilder::new().title("t").timestamp(at).build()
    }

    #[test]
    fn blank_query_matches_everything() {
        let note = note_in("Paris", "France");
        assert!(matches_search(&note, "", SearchScope::Standard));
        assert!(matches_search(&note, "   ", SearchScope::Standard));
    }

    #[test]
    fn search_is_case_insensitive_across_title_body_and_city() {
        let note = note_in("Paris", "France");
        assert!(matches_search(&note, "MORNING", SearchScope::Standard));
        assert!(matches_search(&note, "river", SearchScope::Standard));
        assert!(matches_search(&note, "par", SearchScope::Standard));
        assert!(!matches_search(&note, "xyz", SearchScope::Standard));
    }

    #[test]
    fn country_is_only_searched_when_scope_includes_it() {
        let note = note_in("Paris", "France");
        assert!(!matches_search(&note, "fran", SearchScope::Standard));
        assert!(matches_search(&note, "fran", SearchScope::IncludeCountry));
    }

    #[test]
    fn favorite_filter_only_applies_when_enabled() {
        let plain = NoteBuilder::new().title("a").build();
        let starred = NoteBuilder::new().title("b").favorite(true).build();

        assert!(matches_favorite(&plain, false));
        assert!(!matches_favorite(&plain, true));
        assert!(matches_favorite(&starred, true));
    }

    #[test]
    fn today_uses_local_midnight() {
        let now = datetime!(2024-06-15 10:00 +03:00);

        let just_after_midnight = note_at(datetime!(2024-06-15 00:30 +03:00));
        let just_before_midnight = note_at(datetime!(2024-06-14 23:59 +03:00));

        assert!(matches_date_filter(&just_after_midnight, DateFilter::Today, now, Weekday::Monday));
        assert!(!matches_date_filter(&just_before_midnight, DateFilter::Today, now, Weekday::Monday));
    }

    #[test]
    fn today_compares_instants_stored_in_utc() {
        let now = datetime!(2024-06-15 10:00 +03:00);
        // 2024-06-14 21:30 UTC is 00:30 local on the 15th.
        let note = note_at(datetime!(2024-06-14 21:30 UTC));
        assert!(matches_date_filter(&note, DateFilter::Today, now, Weekday::Monday));
    }

    #[test]
    fn week_bound_respects_first_day_of_week() {
        // Saturday.
        let now = datetime!(2024-06-15 10:00 UTC);

        assert_eq!(
            DateFilter::ThisWeek.lower_bound(now, Weekday::Monday),
            Some(datetime!(2024-06-10 00:00 UTC))
        );
        assert_eq!(
            DateFilter::ThisWeek.lower_bound(now, Weekday::Sunday),
            Some(datetime!(2024-06-09 00:00 UTC))
        );
        assert_eq!(
            DateFilter::ThisWeek.lower_bound(now, Weekday::Saturday),
            Some(datetime!(2024-06-15 00:00 UTC))
        );
    }

    #[test]
    fn month_and_year_bounds_start_on_the_first() {
        let now = datetime!(2024-06-15 10:00 -05:00);

        assert_eq!(
            DateFilter::ThisMonth.lower_bound(now, Weekday::Monday),
            Some(datetime!(2024-06-01 00:00 -05:00))
        );
        assert_eq!(
            DateFilter::ThisYear.lower_bound(now, Weekday::Monday),
            Some(datetime!(2024-01-01 00:00 -05:00))
        );
        assert_eq!(DateFilter::All.lower_bound(now, Weekday::Monday), None);
    }

    #[test]
    fn start_of_week_is_identity_on_week_start() {
        assert_eq!(start_of_week(date!(2024-06-10), Weekday::Monday), date!(2024-06-10));
        assert_eq!(start_of_week(date!(2024-06-16), Weekday::Monday), date!(2024-06-10));
    }

    #[test]
    fn city_match_is_exact_and_skips_sentinels() {
        let paris = note_in("Paris", "France");
        assert!(matches_city(&paris, "Paris"));
        assert!(!matches_city(&paris, "paris"));

        let unknown = note_in(UNKNOWN_CITY, "Unknown");
        assert!(!matches_city(&unknown, UNKNOWN_CITY));

        let blank = note_in("", "");
        assert!(!matches_city(&blank, ""));
    }

    #[test]
    fn date_filter_parses_loose_tokens() {
        assert_eq!("this-week".parse::<DateFilter>().unwrap(), DateFilter::ThisWeek);
        assert_eq!("Month".parse::<DateFilter>().unwrap(), DateFilter::ThisMonth);
        assert_eq!(
            "fortnight".parse::<DateFilter>(),
            Err(QueryError::UnknownDateFilter("fortnight".to_string()))
        );
    }

    #[test]
    fn weekday_parses_names_and_abbreviations() {
        assert_eq!(parse_weekday("Sunday").unwrap(), Weekday::Sunday);
        assert_eq!(parse_weekday("mon").unwrap(), Weekday::Monday);
        assert!(parse_weekday("someday").is_err());
    }

    #[test]
    fn local_date_uses_the_offset_of_now_only() {
        // Written at 00:30 summer time (+02:00), read back in winter (+01:00).
        let summer_note = datetime!(2024-07-01 00:30 +2);
        let winter_now = datetime!(2024-12-01 12:00 +1);

        assert_eq!(local_date(summer_note, winter_now), date!(2024-06-30));
        assert_eq!(local_date(summer_note, datetime!(2024-07-02 12:00 +2)), date!(2024-07-01));
    }
}
