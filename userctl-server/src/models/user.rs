//! User input validation
//!
//! Rules are checked in a fixed order and the first failure wins:
//! presence, then length, then email format.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for name and email, in characters
pub const MAX_FIELD_LEN: usize = 30;

/// Loose `local@domain.tld` shape: no whitespace, exactly one `@`,
/// at least one dot after it.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// Validated name/email pair, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    name: String,
    email: String,
}

impl UserDraft {
    /// Validate raw fields from a request body.
    ///
    /// # Example
    /// ```
    /// use userctl_server::models::{UserDraft, ValidationError};
    ///
    /// assert!(UserDraft::new(Some("Ada"), Some("ada@example.com")).is_ok());
    /// assert_eq!(
    ///     UserDraft::new(Some("Ada"), None).unwrap_err(),
    ///     ValidationError::Required
    /// );
    /// ```
    pub fn new(name: Option<&str>, email: Option<&str>) -> Result<Self, ValidationError> {
        let (name, email) = match (name, email) {
            (Some(n), Some(e)) if !n.is_empty() && !e.is_empty() => (n, e),
            _ => return Err(ValidationError::Required),
        };

        if name.chars().count() > MAX_FIELD_LEN || email.chars().count() > MAX_FIELD_LEN {
            return Err(ValidationError::TooLong { max: MAX_FIELD_LEN });
        }

        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Self {
            name: name.to_owned(),
            email: email.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Database-assigned user id, always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i32);

impl UserId {
    /// Parse a path segment. Anything but a positive `i32` is rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.parse::<i32>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ValidationError::InvalidUserId),
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
