//! API models: the response envelope, request DTOs, and the error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_forms::{AnswerMap, Field, FormKind, FormPatch, FormsError, NewForm};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Standard API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Core error carried through handlers and mapped to HTTP at the boundary.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub FormsError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            FormsError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            FormsError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            // Draft forms are invisible to respondents, so this reads as 404.
            FormsError::NotPublished => (StatusCode::NOT_FOUND, "not_published"),
            FormsError::DuplicateSubmission => (StatusCode::CONFLICT, "duplicate_submission"),
            FormsError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(ApiResponse::<()>::error(code, &self.0.to_string()))).into_response()
    }
}

// ============ Forms ============

/// Form creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct FormCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, example = "form")]
    pub form_kind: FormKind,
    #[serde(default)]
    pub published: bool,
    /// Ordered question list
    #[schema(value_type = Vec<Object>)]
    pub fields: Vec<Field>,
}

impl FormCreate {
    pub fn into_new_form(self, created_by: String) -> NewForm {
        NewForm {
            title: self.title,
            description: self.description,
            form_kind: self.form_kind,
            published: self.published,
            fields: self.fields,
            created_by,
        }
    }
}

/// Form update request: a whole-document replace of the mutable fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FormUpdate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, example = "poll")]
    pub form_kind: FormKind,
    pub published: bool,
    #[schema(value_type = Vec<Object>)]
    pub fields: Vec<Field>,
}

impl From<FormUpdate> for FormPatch {
    fn from(update: FormUpdate) -> Self {
        FormPatch {
            title: update.title,
            description: update.description,
            form_kind: update.form_kind,
            published: update.published,
            fields: update.fields,
        }
    }
}

/// Publish toggle request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub published: bool,
}

// ============ Submissions ============

/// Response submission request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Answer map keyed by field id: string values for text/date/single
    /// choice kinds, string arrays for multi choice.
    #[schema(value_type = Object)]
    pub answers: AnswerMap,
}
