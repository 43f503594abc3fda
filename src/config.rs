//! Runtime configuration read from the environment.
//!
//! | Variable                 | Default                        |
//! |--------------------------|--------------------------------|
//! | `GEONOTE_DB`             | `{data_dir}/geonote/notes.db`  |
//! | `GEONOTE_USER`           | `local`                        |
//! | `GEONOTE_UTC_OFFSET`     | system offset, else UTC        |
//! | `GEONOTE_WEEK_START`     | `monday`                       |
//! | `GEONOTE_SEARCH_COUNTRY` | `false`                        |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{UtcOffset, Weekday};

use crate::clock::SystemClock;
use crate::models::UserId;
use crate::query::{SearchScope, parse_weekday};

const OFFSET_FORMAT: &[FormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

/// A configuration variable held a value that could not be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid UTC offset '{value}' (expected +HH:MM)")]
    InvalidOffset { key: &'static str, value: String },

    #[error("{key}: unknown weekday '{value}'")]
    InvalidWeekday { key: &'static str, value: String },

    #[error("{key}: expected true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error("{key}: must not be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub user_id: UserId,
    /// Offset defining the local calendar. `None` uses the system offset.
    pub utc_offset: Option<UtcOffset>,
    pub week_start: Weekday,
    pub search_scope: SearchScope,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let database_path = match get("GEONOTE_DB") {
            Some(path) if path.is_empty() => {
                return Err(ConfigError::Empty { key: "GEONOTE_DB" }.into());
            }
            Some(path) => PathBuf::from(path),
            None => get_database_path()?,
        };

        let user_id = match get("GEONOTE_USER") {
            Some(user) if user.is_empty() => {
                return Err(ConfigError::Empty { key: "GEONOTE_USER" }.into());
            }
            Some(user) => UserId::new(user),
            None => UserId::new("local"),
        };

        let utc_offset = get("GEONOTE_UTC_OFFSET")
            .map(|value| parse_offset(&value))
            .transpose()?;

        let week_start = match get("GEONOTE_WEEK_START") {
            Some(value) => parse_weekday(&value).map_err(|_| ConfigError::InvalidWeekday {
                key: "GEONOTE_WEEK_START",
                value,
            })?,
            None => Weekday::Monday,
        };

        let search_scope = match get("GEONOTE_SEARCH_COUNTRY") {
            Some(value) => {
                if parse_bool("GEONOTE_SEARCH_COUNTRY", &value)? {
                    SearchScope::IncludeCountry
                } else {
                    SearchScope::Standard
                }
            }
            None => SearchScope::Standard,
        };

        Ok(Self {
            database_path,
            user_id,
            utc_offset,
            week_start,
            search_scope,
        })
    }

    /// Wall clock in the configured offset.
    pub fn clock(&self) -> SystemClock {
        match self.utc_offset {
            Some(offset) => SystemClock::new(offset),
            None => SystemClock::local(),
        }
    }
}

fn parse_offset(value: &str) -> Result<UtcOffset, ConfigError> {
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(value, OFFSET_FORMAT).map_err(|_| ConfigError::InvalidOffset {
        key: "GEONOTE_UTC_OFFSET",
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/geonote/notes.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("geonote").join("notes.db"))
}

/// Ensures the parent directory of the database file exists.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}
