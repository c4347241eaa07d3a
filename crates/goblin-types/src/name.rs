//! Validated pet name.
//!
//! Names arrive from the UI as free text. [`PetName::parse`] trims the input
//! and enforces the 1 to 10 character limit so invalid input is rejected at
//! the boundary, before it can reach the engine.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum name length in characters.
pub const MAX_NAME_CHARS: usize = 10;

/// Name given to a freshly hatched pet.
pub const DEFAULT_NAME: &str = "Gob";

/// Reasons a pet name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name is empty after trimming.
    #[error("pet name must not be empty")]
    Empty,

    /// The name is longer than [`MAX_NAME_CHARS`].
    #[error("pet name is {len} characters, the limit is {max}")]
    TooLong {
        /// Length of the trimmed input in characters.
        len: usize,
        /// The configured maximum.
        max: usize,
    },
}

/// A trimmed, non-empty name of at most [`MAX_NAME_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PetName(String);

impl PetName {
    /// Validate and normalize a raw name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Empty`] for blank input and
    /// [`NameError::TooLong`] when the trimmed name exceeds the limit.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_NAME_CHARS {
            return Err(NameError::TooLong {
                len,
                max: MAX_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PetName {
    fn default() -> Self {
        Self(DEFAULT_NAME.to_owned())
    }
}

impl TryFrom<String> for PetName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PetName> for String {
    fn from(name: PetName) -> Self {
        name.0
    }
}

impl fmt::Display for PetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let name = PetName::parse("  Grub  ");
        assert_eq!(name.map(|n| n.to_string()), Ok(String::from("Grub")));
    }

    #[test]
    fn rejects_blank_names() {
        assert_eq!(PetName::parse(""), Err(NameError::Empty));
        assert_eq!(PetName::parse("   \t"), Err(NameError::Empty));
    }

    #[test]
    fn accepts_exactly_ten_characters() {
        assert!(PetName::parse("abcdefghij").is_ok());
        assert_eq!(
            PetName::parse("abcdefghijk"),
            Err(NameError::TooLong { len: 11, max: 10 })
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(PetName::parse("ゴブリンゴブリン").is_ok());
    }

    #[test]
    fn default_is_gob() {
        assert_eq!(PetName::default().as_str(), "Gob");
    }
}
