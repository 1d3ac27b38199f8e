//! Caller identity extraction.
//!
//! Authentication lives in the platform's auth collaborator, outside this
//! service; by the time a request arrives here it has been authorized, and
//! the caller's identity travels as an opaque id in the `x-user-id` header.
//! No role checks happen in the core.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::ApiResponse;

/// Header carrying the opaque caller id.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Opaque caller identity. Operators create and manage forms; respondents
/// submit to them; this service treats both as plain string keys.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = MissingIdentity;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Identity(value.to_string()))
            .ok_or(MissingIdentity)
    }
}

/// Rejection for requests arriving without a caller id.
#[derive(Debug)]
pub struct MissingIdentity;

impl IntoResponse for MissingIdentity {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                "missing_identity",
                "request has no caller identity",
            )),
        )
            .into_response()
    }
}
