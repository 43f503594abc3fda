//! Orderings over note collections.
//!
//! Every strategy is a stable sort: notes with equal keys keep their input order.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::QueryError;
use super::filter::normalize_token;
use crate::models::Note;

/// How a note list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    DateNewest,
    DateOldest,
    TitleAz,
    TitleZa,
    FavoritesFirst,
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DateNewest => "date_newest",
            Self::DateOldest => "date_oldest",
            Self::TitleAz => "title_az",
            Self::TitleZa => "title_za",
            Self::FavoritesFirst => "favorites_first",
        };
        f.write_str(label)
    }
}

impl FromStr for SortOption {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "newest" | "date_newest" => Ok(Self::DateNewest),
            "oldest" | "date_oldest" => Ok(Self::DateOldest),
            "az" | "title_az" => Ok(Self::TitleAz),
            "za" | "title_za" => Ok(Self::TitleZa),
            "favorites" | "favorites_first" => Ok(Self::FavoritesFirst),
            _ => Err(QueryError::UnknownSortOption(s.to_string())),
        }
    }
}

/// Sorts `notes` in place.
///
/// Date orderings use the creation timestamp, with the id breaking ties so
/// notes created in the same millisecond still order by insertion.
pub fn sort_notes<N: AsRef<Note>>(notes: &mut [N], option: SortOption) {
    match option {
        SortOption::DateNewest => {
            notes.sort_by_key(|n| Reverse((n.as_ref().timestamp(), n.as_ref().id())))
        }
        SortOption::DateOldest => notes.sort_by_key(|n| (n.as_ref().timestamp(), n.as_ref().id())),
        SortOption::TitleAz => notes.sort_by_cached_key(|n| n.as_ref().title().to_lowercase()),
        SortOption::TitleZa => {
            notes.sort_by_cached_key(|n| Reverse(n.as_ref().title().to_lowercase()))
        }
        // Stable partition, not a secondary sort.
        SortOption::FavoritesFirst => notes.sort_by_key(|n| !n.as_ref().is_favorite()),
    }
}
