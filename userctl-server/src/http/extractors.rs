//! Custom Axum extractors
//!
//! Each one rejects with an `ApiError`, so malformed input gets the same
//! JSON error body as every other failure.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::{header, request::Parts, HeaderMap};
use axum::{Form, Json};
use serde::Deserialize;

use super::error::ApiError;
use crate::models::{Pagination, UserDraft, UserId, ValidationError};

/// Extract and validate a user id from path
pub struct ValidUserId(pub UserId);

impl<S> FromRequestParts<S> for ValidUserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::InvalidUserId))?;

        Ok(Self(UserId::parse(&id)?))
    }
}

/// Raw `{name, email}` body; both optional so absence is reported by
/// validation rather than by the body parser.
#[derive(Debug, Default, Deserialize)]
struct UserPayload {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    /// Missing or unrecognized content type; the body is ignored
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return BodyKind::Other;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json")) {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

fn invalid_body(rejection: impl std::fmt::Display) -> ApiError {
    tracing::debug!(%rejection, "rejected user body");
    ApiError::Validation(ValidationError::InvalidBody)
}

/// Extract a JSON or form-encoded body and validate it into a [`UserDraft`]
///
/// An empty body, or one without a recognized content type, reads as `{}`
/// so validation reports the missing fields.
pub struct ValidUserDraft(pub UserDraft);

impl<S> FromRequest<S> for ValidUserDraft
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let payload = match body_kind(req.headers()) {
            BodyKind::Form => {
                let Form(payload) = Form::<UserPayload>::from_request(req, state)
                    .await
                    .map_err(invalid_body)?;
                payload
            }
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(invalid_body)?;
                if bytes.is_empty() {
                    UserPayload::default()
                } else {
                    let Json(payload) = Json::<UserPayload>::from_bytes(&bytes).map_err(invalid_body)?;
                    payload
                }
            }
            BodyKind::Other => UserPayload::default(),
        };

        let draft = UserDraft::new(payload.name.as_deref(), payload.email.as_deref())?;
        Ok(Self(draft))
    }
}

#[derive(Debug, Default)]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
}

impl ListParams {
    /// First occurrence of each key wins; unknown keys are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "search" => &mut params.search,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// `?page&limit&search` for the user list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub pagination: Pagination,
    /// Non-empty search term, if any
    pub search: Option<String>,
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs): Query<Vec<(String, String)>> = Query::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "rejected list query");
                ApiError::Validation(ValidationError::InvalidPagination)
            })?;
        let params = ListParams::from_pairs(pairs);

        let pagination = Pagination::parse(params.page.as_deref(), params.limit.as_deref())?;
        let search = params.search.filter(|s| !s.is_empty());

        Ok(Self { pagination, search })
    }
}
