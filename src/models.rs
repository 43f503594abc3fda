mod category;
mod ids;
mod location;
mod note;
mod validation;

pub use category::Category;
pub use ids::{NoteId, UserId};
pub use location::{Location, UNKNOWN_CITY, UNKNOWN_COUNTRY, is_known_city};
pub use note::{Note, NoteBuilder, from_millis, to_millis};
pub use validation::{MAX_PHOTOS_PER_NOTE, NoteError, validate_photos, validate_title};
