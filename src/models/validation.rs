use thiserror::Error;

/// Maximum number of photos accepted when a note is created or edited.
pub const MAX_PHOTOS_PER_NOTE: usize = 5;

/// Errors raised when note input is rejected at the edit boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("Note title cannot be empty")]
    EmptyTitle,

    #[error("A note can hold at most {max} photos, got {count}")]
    TooManyPhotos { count: usize, max: usize },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),
}

/// Rejects blank titles.
pub fn validate_title(title: &str) -> Result<(), NoteError> {
    if title.trim().is_empty() {
        return Err(NoteError::EmptyTitle);
    }
    Ok(())
}

/// Rejects photo lists longer than [`MAX_PHOTOS_PER_NOTE`].
pub fn validate_photos(photos: &[String]) -> Result<(), NoteError> {
    if photos.len() > MAX_PHOTOS_PER_NOTE {
        return Err(NoteError::TooManyPhotos {
            count: photos.len(),
            max: MAX_PHOTOS_PER_NOTE,
        });
    }
    Ok(())
}
