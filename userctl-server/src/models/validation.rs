//! Validation error types

use std::fmt;

/// Validation error for user input
///
/// The `Display` output is the exact message returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name or email missing (or empty)
    Required,

    /// Name or email exceeds maximum length
    TooLong { max: usize },

    /// Email doesn't match `local@domain.tld`
    InvalidEmail,

    /// Path id is not a positive integer
    InvalidUserId,

    /// `page` or `limit` is not a positive integer
    InvalidPagination,

    /// Request body is not a JSON object of strings
    InvalidBody,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "Name and email are required"),
            Self::TooLong { max } => {
                write!(f, "Name and email must be {} characters or less", max)
            }
            Self::InvalidEmail => write!(f, "Invalid email format"),
            Self::InvalidUserId => write!(f, "Invalid user ID"),
            Self::InvalidPagination => write!(f, "Invalid pagination parameters"),
            Self::InvalidBody => write!(f, "Invalid JSON body"),
        }
    }
}

impl std::error::Error for ValidationError {}
