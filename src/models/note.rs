use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Location, NoteError, NoteId, UserId};

/// A geotagged journal entry.
///
/// Notes are the unit every query and aggregation works on. The creation
/// timestamp is set once and never changed by edits or favorite toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    user_id: UserId,
    title: String,
    content: String,
    location: Location,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    category: String,
    is_favorite: bool,
    photos: Vec<String>,
}

impl Note {
    /// Returns the note's unique identifier.
    pub fn id(&self) -> NoteId {
        self.id
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Shorthand for `location().city`.
    pub fn city(&self) -> &str {
        &self.location.city
    }

    /// Shorthand for `location().country`.
    pub fn country(&self) -> &str {
        &self.location.country
    }

    /// Returns true unless the city is blank or the "Unknown City" sentinel.
    pub fn has_known_city(&self) -> bool {
        self.location.has_known_city()
    }

    /// When the note was created.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        to_millis(self.timestamp)
    }

    /// Returns the stored category label.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// Photo references in insertion order.
    pub fn photos(&self) -> &[String] {
        &self.photos
    }
}

impl AsRef<Note> for Note {
    fn as_ref(&self) -> &Note {
        self
    }
}

/// Converts an instant to milliseconds since the Unix epoch.
pub fn to_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Converts milliseconds since the Unix epoch to a UTC instant.
pub fn from_millis(millis: i64) -> Result<OffsetDateTime, NoteError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|_| NoteError::TimestampOutOfRange(millis))
}

/// Builder for constructing `Note` instances with optional fields.
///
/// # Examples
///
/// ```
/// use geonote::{Location, NoteBuilder, NoteId};
///
/// let note = NoteBuilder::new()
///     .id(NoteId::new(1))
///     .user_id("alice")
///     .title("Coffee")
///     .location(Location::at(48.85, 2.35).in_city("Paris", "France"))
///     .build();
///
/// assert_eq!(note.id(), NoteId::new(1));
/// assert_eq!(note.city(), "Paris");
/// assert_eq!(note.category(), "Personal");
/// assert!(note.photos().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NoteBuilder {
    id: Option<NoteId>,
    user_id: Option<UserId>,
    title: Option<String>,
    content: Option<String>,
    location: Option<Location>,
    timestamp: Option<OffsetDateTime>,
    category: Option<String>,
    is_favorite: bool,
    photos: Option<Vec<String>>,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the note ID.
    pub fn id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the owning user.
    pub fn user_id(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the creation timestamp.
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the category label. Accepts a [`Category`](super::Category) or raw text.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn photos(mut self, photos: Vec<String>) -> Self {
        self.photos = Some(photos);
        self
    }

    /// Builds the `Note`, using defaults for unset fields.
    ///
    /// An unset id is [`NoteId::UNSAVED`], an unset timestamp is the current
    /// time and an unset category is "Personal". No validation is performed;
    /// the store validates input before persisting it.
    pub fn build(self) -> Note {
        Note {
            id: self.id.unwrap_or(NoteId::UNSAVED),
            user_id: self.user_id.unwrap_or_else(|| UserId::new("")),
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
            category: self
                .category
                .unwrap_or_else(|| super::Category::default().into()),
            is_favorite: self.is_favorite,
            photos: self.photos.unwrap_or_default(),
        }
    }
}
