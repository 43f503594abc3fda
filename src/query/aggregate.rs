//! Reducers turning a note collection into summary data for statistics screens.
//!
//! Every aggregator accepts any iterator of note references, so it can run on a
//! full snapshot or on the output of [`execute`](super::execute). Empty input
//! always produces an empty or zero-filled result.

use std::cmp::Reverse;
use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

use super::filter::{local_date, local_midnight, matches_city};
use super::sort::{SortOption, sort_notes};
use crate::models::Note;

/// Upper bound on buckets reserved up front for an activity series.
const PREALLOCATED_DAYS: usize = 366;

/// Number of notes placed in one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

/// Number of notes filed under one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Category count with its whole-number share of the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub percent: u32,
}

/// Notes created on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: Date,
    pub count: usize,
}

/// A note written on today's month and day in an earlier year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memory<'a> {
    pub note: &'a Note,
    pub years_ago: i32,
}

/// Collection-wide totals for dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_notes: usize,
    pub favorite_notes: usize,
    pub total_photos: usize,
    pub users: usize,
}

/// Counts notes per city, most notes first.
///
/// Blank cities and the "Unknown City" sentinel are skipped. Cities with equal
/// counts keep the order in which they were first seen.
pub fn city_counts<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<CityCount> {
    let mut buckets: IndexMap<&str, usize> = IndexMap::new();
    for note in notes.into_iter().filter(|n| n.has_known_city()) {
        *buckets.entry(note.city()).or_default() += 1;
    }

    let mut counts: Vec<CityCount> = buckets
        .into_iter()
        .map(|(city, count)| CityCount {
            city: city.to_string(),
            count,
        })
        .collect();
    counts.sort_by_key(|c| Reverse(c.count));
    counts
}

/// Counts notes per stored category label, most notes first.
///
/// Nothing is excluded: a blank label is a bucket of its own.
pub fn category_counts<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<CategoryCount> {
    let mut buckets: IndexMap<&str, usize> = IndexMap::new();
    for note in notes {
        *buckets.entry(note.category()).or_default() += 1;
    }

    let mut counts: Vec<CategoryCount> = buckets
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    counts.sort_by_key(|c| Reverse(c.count));
    counts
}

/// Category counts with their share of all notes.
pub fn category_shares<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<CategoryShare> {
    let counts = category_counts(notes);
    let total: usize = counts.iter().map(|c| c.count).sum();

    counts
        .into_iter()
        .map(|c| CategoryShare {
            percent: percentage(c.count, total),
            category: c.category,
            count: c.count,
        })
        .collect()
}

/// The city with the most notes, or `None` when no note has a known city.
pub fn top_city<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Option<CityCount> {
    city_counts(notes).into_iter().next()
}

/// Per-day note counts over the trailing `days` local days ending today.
///
/// The series runs oldest day first and contains every day of the window,
/// with 0 for days without notes. A window reaching past the earliest
/// representable date starts at that date instead.
pub fn daily_activity<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    days: u32,
    now: OffsetDateTime,
) -> Vec<DayCount> {
    let Some(first_day) = window_start(days, now) else {
        return Vec::new();
    };

    let today = now.date();
    let mut buckets: IndexMap<Date, usize> =
        IndexMap::with_capacity((days as usize).min(PREALLOCATED_DAYS));
    let mut day = Some(first_day);
    while let Some(current) = day.filter(|d| *d <= today) {
        buckets.insert(current, 0);
        day = current.next_day();
    }

    for note in notes {
        if let Some(count) = buckets.get_mut(&local_date(note.timestamp(), now)) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

/// Notes created within the trailing `days` local days, newest first.
pub fn recent_notes<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    days: u32,
    now: OffsetDateTime,
) -> Vec<&'a Note> {
    let Some(first_day) = window_start(days, now) else {
        return Vec::new();
    };
    let cutoff = local_midnight(first_day, now);

    let mut recent: Vec<&Note> = notes
        .into_iter()
        .filter(|n| n.timestamp() >= cutoff)
        .collect();
    sort_notes(&mut recent, SortOption::DateNewest);
    recent
}

/// Picks the oldest note written on today's month and day in an earlier year.
///
/// Dates are compared as local month and day, so a note from February 29th
/// only resurfaces on February 29th. When several notes share the largest
/// gap, the first one in input order wins.
pub fn on_this_day<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    now: OffsetDateTime,
) -> Option<Memory<'a>> {
    let today = now.date();
    let mut best: Option<Memory<'a>> = None;

    for note in notes {
        let day = local_date(note.timestamp(), now);
        if day.month() != today.month() || day.day() != today.day() || day.year() >= today.year() {
            continue;
        }

        let years_ago = today.year() - day.year();
        if best.as_ref().is_none_or(|b| years_ago > b.years_ago) {
            best = Some(Memory { note, years_ago });
        }
    }

    best
}

/// Notes placed in `city`, newest first.
pub fn notes_in_city<'a>(notes: impl IntoIterator<Item = &'a Note>, city: &str) -> Vec<&'a Note> {
    let mut matching: Vec<&Note> = notes
        .into_iter()
        .filter(|n| matches_city(n, city))
        .collect();
    sort_notes(&mut matching, SortOption::DateNewest);
    matching
}

/// Favorite notes in input order.
pub fn favorites<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<&'a Note> {
    notes.into_iter().filter(|n| n.is_favorite()).collect()
}

/// Every photo reference, in note order then photo order.
pub fn photo_gallery<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<&'a str> {
    notes
        .into_iter()
        .flat_map(|n| n.photos().iter().map(String::as_str))
        .collect()
}

pub fn overview<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Overview {
    let mut overview = Overview::default();
    let mut users = HashSet::new();

    for note in notes {
        overview.total_notes += 1;
        overview.total_photos += note.photos().len();
        if note.is_favorite() {
            overview.favorite_notes += 1;
        }
        users.insert(note.user_id());
    }

    overview.users = users.len();
    overview
}

/// Whole-number percentage of `count` in `total`, truncated. 0 when `total` is 0.
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count.saturating_mul(100) / total) as u32
}

/// First local day of a trailing window, clamped to the calendar's range.
fn window_start(days: u32, now: OffsetDateTime) -> Option<Date> {
    if days == 0 {
        return None;
    }
    let back = Duration::days(i64::from(days) - 1);
    Some(now.date().checked_sub(back).unwrap_or(Date::MIN))
}
