//! Tag name validation for presets.
//!
//! Tags are stored lowercased and trimmed. A valid tag:
//! - Is not empty
//! - Contains no whitespace
//! - Contains neither `#` (the search prefix) nor `,` (the list separator)
//! - Does not start with `-` (the negation prefix)

/// Normalizes and validates a single tag.
///
/// A leading `#` is accepted and stripped, since tags are often typed the way
/// they are searched.
///
/// # Examples
/// ```
/// use presetapp::tags::validation::normalize_tag;
///
/// assert_eq!(normalize_tag(" Fire ").unwrap(), "fire");
/// assert_eq!(normalize_tag("#Dungeon-Tiles").unwrap(), "dungeon-tiles");
///
/// assert!(normalize_tag("").is_err());
/// assert!(normalize_tag("two words").is_err());
/// assert!(normalize_tag("-wip").is_err());
/// assert!(normalize_tag("a,b").is_err());
/// ```
pub fn normalize_tag(raw: &str) -> Result<String, TagValidationError> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix('#').unwrap_or(trimmed).to_lowercase();
    validate_tag_name(&name)?;
    Ok(name)
}

/// Validates an already normalized tag.
pub fn validate_tag_name(name: &str) -> Result<(), TagValidationError> {
    let Some(first) = name.chars().next() else {
        return Err(TagValidationError::Empty);
    };
    if first == '-' {
        return Err(TagValidationError::InvalidStart(first));
    }
    for ch in name.chars() {
        if ch.is_whitespace() {
            return Err(TagValidationError::Whitespace);
        }
        if ch == '#' || ch == ',' {
            return Err(TagValidationError::InvalidCharacter(ch));
        }
        if ch.is_uppercase() {
            return Err(TagValidationError::NotLowercase);
        }
    }
    Ok(())
}

/// Error type for tag validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    Empty,
    /// Starts with the negation prefix
    InvalidStart(char),
    Whitespace,
    /// Contains a reserved character
    InvalidCharacter(char),
    NotLowercase,
}

impl std::fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValidationError::Empty => write!(f, "tag cannot be empty"),
            TagValidationError::InvalidStart(ch) => {
                write!(f, "tag cannot start with '{}'", ch)
            }
            TagValidationError::Whitespace => write!(f, "tag cannot contain whitespace"),
            TagValidationError::InvalidCharacter(ch) => {
                write!(f, "tag contains reserved character '{}'", ch)
            }
            TagValidationError::NotLowercase => write!(f, "tag must be lowercase"),
        }
    }
}

impl std::error::Error for TagValidationError {}
