//! Student-facing endpoints: published forms and response submission.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use portal_forms::{FormDefinition, FormsError, ListFilter};

use crate::identity::Identity;
use crate::models::{ApiError, ApiResponse, SubmitRequest};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/forms", get(list_published))
        .route("/forms/:id", get(get_published))
        .route("/forms/:id/submit", post(submit))
}

#[derive(serde::Deserialize)]
pub struct ListParams {
    search: Option<String>,
}

/// One published form from the student's point of view.
#[derive(Serialize)]
pub struct StudentFormEntry {
    #[serde(flatten)]
    pub form: FormDefinition,
    /// Whether the calling student has already submitted to this form.
    pub submitted: bool,
}

/// Published forms with the caller's submission status
#[utoipa::path(
    get,
    path = "/api/v1/student/forms",
    params(
        ("search" = Option<String>, Query, description = "Substring match over title/description")
    ),
    responses(
        (status = 200, description = "Published forms")
    ),
    tag = "student"
)]
pub async fn list_published(
    State(state): State<Arc<ApiState>>,
    identity: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<StudentFormEntry>>>, ApiError> {
    let entries = state
        .platform
        .forms
        .list(ListFilter { kind: None, search: params.search })
        .await?;

    let mut visible = Vec::new();
    for entry in entries {
        if !entry.form.published {
            continue;
        }
        let submitted = state
            .platform
            .submissions
            .has_submitted(entry.form.id, &identity.0)
            .await?;
        visible.push(StudentFormEntry { form: entry.form, submitted });
    }
    Ok(Json(ApiResponse::success(visible)))
}

/// Fetch one published form
#[utoipa::path(
    get,
    path = "/api/v1/student/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Published form"),
        (status = 404, description = "Unknown or unpublished form")
    ),
    tag = "student"
)]
pub async fn get_published(
    State(state): State<Arc<ApiState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<StudentFormEntry>>, ApiError> {
    let form = state.platform.forms.get(id).await?;
    if !form.published {
        // Drafts are indistinguishable from missing forms for students.
        return Err(ApiError(FormsError::NotPublished));
    }
    let submitted = state
        .platform
        .submissions
        .has_submitted(form.id, &identity.0)
        .await?;
    Ok(Json(ApiResponse::success(StudentFormEntry { form, submitted })))
}

/// Submit a response to a published form
#[utoipa::path(
    post,
    path = "/api/v1/student/forms/{id}/submit",
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Response recorded"),
        (status = 400, description = "Required answers missing or malformed"),
        (status = 404, description = "Unknown or unpublished form"),
        (status = 409, description = "Already submitted")
    ),
    tag = "student"
)]
pub async fn submit(
    State(state): State<Arc<ApiState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(input): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = state
        .platform
        .submissions
        .submit(id, &identity.0, input.answers)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(submission))))
}
