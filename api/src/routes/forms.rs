//! Form management endpoints (operator-facing)

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use portal_forms::{
    export_csv, export_filename, summarize, FieldSummary, FormDefinition, FormKind,
    FormListEntry, FormsError, ListFilter, Submission, SubmissionView,
};

use crate::identity::Identity;
use crate::models::{ApiError, ApiResponse, FormCreate, FormUpdate, PublishRequest};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/:id", get(get_form).put(update_form).delete(delete_form))
        .route("/:id/published", patch(set_published))
        .route("/:id/responses", get(form_responses))
        .route("/:id/summary", get(form_summary))
        .route("/:id/export", get(export_responses))
}

#[derive(serde::Deserialize)]
pub struct ListParams {
    kind: Option<FormKind>,
    search: Option<String>,
}

/// Per-field summaries over a form's responses.
#[derive(Serialize)]
pub struct SummaryPayload {
    pub total_responses: usize,
    pub fields: Vec<FieldSummary>,
}

/// List forms, newest first, with response counts
#[utoipa::path(
    get,
    path = "/api/v1/forms",
    params(
        ("kind" = Option<String>, Query, description = "Filter by form kind (form|poll)"),
        ("search" = Option<String>, Query, description = "Substring match over title/description")
    ),
    responses(
        (status = 200, description = "List of forms")
    ),
    tag = "forms"
)]
pub async fn list_forms(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<FormListEntry>>>, ApiError> {
    let entries = state
        .platform
        .forms
        .list(ListFilter { kind: params.kind, search: params.search })
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// Create a form
#[utoipa::path(
    post,
    path = "/api/v1/forms",
    request_body = FormCreate,
    responses(
        (status = 201, description = "Form created"),
        (status = 400, description = "Invalid title or fields")
    ),
    tag = "forms"
)]
pub async fn create_form(
    State(state): State<Arc<ApiState>>,
    identity: Identity,
    Json(input): Json<FormCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let form = state
        .platform
        .forms
        .create(input.into_new_form(identity.0))
        .await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(form)),
    ))
}

/// Get a form by id
#[utoipa::path(
    get,
    path = "/api/v1/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form details"),
        (status = 404, description = "Form not found")
    ),
    tag = "forms"
)]
pub async fn get_form(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FormDefinition>>, ApiError> {
    let form = state.platform.forms.get(id).await?;
    Ok(Json(ApiResponse::success(form)))
}

/// Replace a form's mutable fields wholesale
#[utoipa::path(
    put,
    path = "/api/v1/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = FormUpdate,
    responses(
        (status = 200, description = "Form updated"),
        (status = 404, description = "Form not found")
    ),
    tag = "forms"
)]
pub async fn update_form(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
    Json(input): Json<FormUpdate>,
) -> Result<Json<ApiResponse<FormDefinition>>, ApiError> {
    let form = state.platform.forms.update(id, input.into()).await?;
    Ok(Json(ApiResponse::success(form)))
}

/// Toggle respondent visibility
#[utoipa::path(
    patch,
    path = "/api/v1/forms/{id}/published",
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Visibility changed"),
        (status = 404, description = "Form not found")
    ),
    tag = "forms"
)]
pub async fn set_published(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
    Json(input): Json<PublishRequest>,
) -> Result<Json<ApiResponse<FormDefinition>>, ApiError> {
    let form = state
        .platform
        .forms
        .set_published(id, input.published)
        .await?;
    Ok(Json(ApiResponse::success(form)))
}

/// Delete a form and all of its responses
#[utoipa::path(
    delete,
    path = "/api/v1/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form and responses deleted"),
        (status = 404, description = "Form not found")
    ),
    tag = "forms"
)]
pub async fn delete_form(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.platform.forms.delete(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Individual responses, newest first, with respondent details
#[utoipa::path(
    get,
    path = "/api/v1/forms/{id}/responses",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Responses to the form"),
        (status = 404, description = "Form not found")
    ),
    tag = "responses"
)]
pub async fn form_responses(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SubmissionView>>>, ApiError> {
    let views = state.platform.submissions.responses(id).await?;
    Ok(Json(ApiResponse::success(views)))
}

/// Per-field summary statistics
#[utoipa::path(
    get,
    path = "/api/v1/forms/{id}/summary",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Summary statistics per field"),
        (status = 404, description = "Form not found")
    ),
    tag = "responses"
)]
pub async fn form_summary(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SummaryPayload>>, ApiError> {
    let form = state.platform.forms.get(id).await?;
    let views = state.platform.submissions.responses(id).await?;
    let submissions: Vec<Submission> =
        views.into_iter().map(|view| view.submission).collect();
    Ok(Json(ApiResponse::success(SummaryPayload {
        total_responses: submissions.len(),
        fields: summarize(&form, &submissions),
    })))
}

/// CSV export of all responses
#[utoipa::path(
    get,
    path = "/api/v1/forms/{id}/export",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 404, description = "Form not found")
    ),
    tag = "responses"
)]
pub async fn export_responses(
    State(state): State<Arc<ApiState>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let form = state.platform.forms.get(id).await?;
    let views = state.platform.submissions.responses(id).await?;
    let csv = export_csv(&form, &views);
    // Quotes would break the header value; the rest of the title passes
    // through as typed.
    let filename = export_filename(&form.title).replace('"', "");
    let disposition = format!("attachment; filename=\"{filename}\"");
    if axum::http::HeaderValue::from_str(&disposition).is_err() {
        return Err(ApiError(FormsError::Validation(
            "form title cannot form a download filename".into(),
        )));
    }
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::{build_router, ApiState};

    fn server() -> TestServer {
        TestServer::new(build_router(ApiState::in_memory())).unwrap()
    }

    fn as_user(name: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static(name),
        )
    }

    fn form_body(published: bool) -> Value {
        json!({
            "title": "Course feedback",
            "description": "End of term",
            "form_kind": "form",
            "published": published,
            "fields": [
                { "id": "q1", "kind": "short_text", "label": "Comment", "required": false }
            ]
        })
    }

    async fn create_form(server: &TestServer, published: bool) -> String {
        let (name, value) = as_user("admin-1");
        let response = server
            .post("/api/v1/forms")
            .add_header(name, value)
            .json(&form_body(published))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let server = server();
        let id = create_form(&server, false).await;

        let (name, value) = as_user("admin-1");
        let response = server
            .get(&format!("/api/v1/forms/{id}"))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["title"], "Course feedback");
        assert_eq!(body["data"]["published"], false);
    }

    #[tokio::test]
    async fn create_without_identity_is_unauthorized() {
        let server = server();
        let response = server.post("/api/v1/forms").json(&form_body(false)).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn short_title_is_a_bad_request() {
        let server = server();
        let (name, value) = as_user("admin-1");
        let mut body = form_body(false);
        body["title"] = json!("ab");
        let response = server
            .post("/api/v1/forms")
            .add_header(name, value)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn delete_cascades_to_responses() {
        let server = server();
        let id = create_form(&server, true).await;

        let (name, value) = as_user("student-1");
        let response = server
            .post(&format!("/api/v1/student/forms/{id}/submit"))
            .add_header(name, value)
            .json(&json!({ "answers": { "q1": "Hi" } }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let (name, value) = as_user("admin-1");
        let response = server
            .delete(&format!("/api/v1/forms/{id}"))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let (name, value) = as_user("admin-1");
        let response = server
            .get(&format!("/api/v1/forms/{id}/responses"))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_sets_csv_headers_and_content() {
        let server = server();
        let id = create_form(&server, true).await;

        let (name, value) = as_user("student-1");
        server
            .post(&format!("/api/v1/student/forms/{id}/submit"))
            .add_header(name, value)
            .json(&json!({ "answers": { "q1": "Hi" } }))
            .await;

        let (name, value) = as_user("admin-1");
        let response = server
            .get(&format!("/api/v1/forms/{id}/export"))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get("content-type").unwrap(),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            headers.get("content-disposition").unwrap(),
            "attachment; filename=\"Course feedback - Responses.csv\""
        );
        let text = response.text();
        assert!(text.starts_with("Respondent Name,Respondent ID,Submitted At,Comment\n"));
        assert!(text.contains(",Hi\n"));
    }

    #[tokio::test]
    async fn summary_counts_choice_answers() {
        let server = server();
        let (name, value) = as_user("admin-1");
        let response = server
            .post("/api/v1/forms")
            .add_header(name, value)
            .json(&json!({
                "title": "Lunch poll",
                "form_kind": "poll",
                "published": true,
                "fields": [{
                    "id": "q1",
                    "kind": "single_choice",
                    "label": "Pick one",
                    "required": true,
                    "options": ["A", "B"]
                }]
            }))
            .await;
        let id = response.json::<Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        for (student, choice) in [("student-1", "A"), ("student-2", "A"), ("student-3", "B")] {
            let (name, value) = as_user(student);
            server
                .post(&format!("/api/v1/student/forms/{id}/submit"))
                .add_header(name, value)
                .json(&json!({ "answers": { "q1": choice } }))
                .await;
        }

        let (name, value) = as_user("admin-1");
        let response = server
            .get(&format!("/api/v1/forms/{id}/summary"))
            .add_header(name, value)
            .await;
        let body: Value = response.json();
        assert_eq!(body["data"]["total_responses"], 3);
        let options = &body["data"]["fields"][0]["stats"]["options"];
        assert_eq!(options[0]["count"], 2);
        assert_eq!(options[0]["percentage"], 67);
        assert_eq!(options[1]["count"], 1);
        assert_eq!(options[1]["percentage"], 33);
    }

    #[tokio::test]
    async fn list_filters_by_kind() {
        let server = server();
        create_form(&server, false).await;
        let (name, value) = as_user("admin-1");
        server
            .post("/api/v1/forms")
            .add_header(name, value)
            .json(&json!({
                "title": "Quick poll",
                "form_kind": "poll",
                "fields": [{
                    "id": "q1",
                    "kind": "single_select",
                    "label": "Pick",
                    "options": ["Yes", "No"]
                }]
            }))
            .await;

        let (name, value) = as_user("admin-1");
        let response = server
            .get("/api/v1/forms?kind=poll")
            .add_header(name, value)
            .await;
        let body: Value = response.json();
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["title"], "Quick poll");
        assert_eq!(entries[0]["submission_count"], 0);
    }
}
