//! Student Portal Forms API
//!
//! REST surface over the forms platform: form building and publishing for
//! administrators, response collection for students, and aggregation with
//! CSV export over collected responses.
//!
//! Authentication, file storage, and the production database live in the
//! portal's hosted backend; this service receives an already-authorized
//! caller identity per request and delegates persistence to the platform's
//! storage collaborator.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod identity;
pub mod models;
pub mod routes;

use axum::routing::get;
use axum::Router;
use portal_forms::FormsPlatform;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use models::*;

/// API state
pub struct ApiState {
    /// Forms platform wired over the storage backend
    pub platform: FormsPlatform,
}

impl ApiState {
    /// State over the in-memory backend (tests, development server).
    pub fn in_memory() -> Self {
        Self { platform: FormsPlatform::in_memory() }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Portal Forms API",
        version = "1.0.0",
        description = "Forms and polls: builder, response collection, aggregation",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::forms::list_forms,
        routes::forms::create_form,
        routes::forms::get_form,
        routes::forms::update_form,
        routes::forms::set_published,
        routes::forms::delete_form,
        routes::forms::form_responses,
        routes::forms::form_summary,
        routes::forms::export_responses,
        routes::student::list_published,
        routes::student::get_published,
        routes::student::submit,
    ),
    components(
        schemas(
            ErrorResponse,
            FormCreate, FormUpdate, PublishRequest, SubmitRequest,
            routes::health::HealthResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "forms", description = "Form building and lifecycle"),
        (name = "responses", description = "Response viewing, summaries, export"),
        (name = "student", description = "Published forms and submission")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/forms", routes::forms::router())
        .nest("/student", routes::student::router())
}
