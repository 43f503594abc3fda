use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::NoteError;

/// Category a note can be filed under.
///
/// Storage keeps the category as free text; this enum is the set offered when
/// creating or editing a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Personal,
    Work,
    Travel,
    Food,
    Shopping,
    Other,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Category; 6] = [
        Self::Personal,
        Self::Work,
        Self::Travel,
        Self::Food,
        Self::Shopping,
        Self::Other,
    ];

    /// Returns the stored label for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Travel => "Travel",
            Self::Food => "Food",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| NoteError::UnknownCategory(s.to_string()))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("travel".parse::<Category>().unwrap(), Category::Travel);
        assert_eq!(" FOOD ".parse::<Category>().unwrap(), Category::Food);
    }

    #[test]
    fn rejects_unknown_category() {
        let err = "groceries".parse::<Category>().unwrap_err();
        assert!(matches!(err, NoteError::UnknownCategory(ref s) if s == "groceries"));
    }

    #[test]
    fn default_is_personal() {
        assert_eq!(Category::default(), Category::Personal);
        assert_eq!(String::from(Category::default()), "Personal");
    }
}
