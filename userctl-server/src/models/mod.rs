//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod user;
pub mod pagination;

pub use validation::ValidationError;
pub use user::{UserDraft, UserId, MAX_FIELD_LEN};
pub use pagination::{PageInfo, Paginated, Pagination, DEFAULT_LIMIT};
