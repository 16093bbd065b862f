//! HTTP routes.
//!
//! Every API response is `{"success": bool, "message": string}`, plus
//! `errors` for validation failures and `data` for stats.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use folio_common::{AnalyticsError, ContactError, FieldError, FolioError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::analytics::{VisitCounters, VisitKind};
use crate::contact::{ContactRelay, ContactSubmission};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Visit counters
    pub counters: VisitCounters,
    /// Contact relay
    pub relay: Arc<ContactRelay>,
}

impl AppState {
    /// Bundles the counters and the relay.
    pub fn new(counters: VisitCounters, relay: ContactRelay) -> Self {
        Self {
            counters,
            relay: Arc::new(relay),
        }
    }
}

/// JSON envelope for every API response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    /// Whether the request did what it asked
    pub success: bool,
    /// Human-readable outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field-level validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    /// Successful response with a message.
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            errors: None,
            data: None,
        }
    }

    /// Successful response with a payload.
    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: None,
            errors: None,
            data: Some(data),
        }
    }

    /// Failed response with a message.
    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            errors: None,
            data: None,
        }
    }
}

/// Handler error, rendered as an `ApiResponse`.
#[derive(Debug)]
pub struct ApiError {
    error: FolioError,
    context: &'static str,
}

impl ApiError {
    /// Wraps an error with the generic message shown for server-side failures.
    pub fn new(error: impl Into<FolioError>, context: &'static str) -> Self {
        Self {
            error: error.into(),
            context,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.error {
            FolioError::Contact(ContactError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                ApiResponse {
                    errors: Some(errors),
                    ..ApiResponse::failure("Validation failed")
                },
            ),
            FolioError::Analytics(
                err @ (AnalyticsError::MissingProjectId | AnalyticsError::ProjectIdTooLong { .. }),
            ) => (StatusCode::BAD_REQUEST, ApiResponse::failure(&err.to_string())),
            other => {
                error!("{}: {other}", self.context);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure(self.context),
                )
            },
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<ApiResponse>, ApiError>;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let analytics = Router::new()
        .route("/page-view", post(page_view))
        .route("/contact-form", post(contact_form))
        .route("/resume-download", post(resume_download))
        .route("/project-view", post(project_view))
        .route("/stats", get(stats));

    let contact = Router::new()
        .route("/", post(submit_contact))
        .route("/health", get(contact_health));

    Router::new()
        .route("/health", get(health))
        .nest("/api/analytics", analytics)
        .nest("/api/contact", contact)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageViewBody {
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectViewBody {
    project_id: Option<String>,
}

/// Parses an optional JSON body; anything unparsable counts as empty.
fn lenient<T: Default + for<'de> Deserialize<'de>>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!("Ignoring malformed body: {e}");
        T::default()
    })
}

async fn page_view(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let body: PageViewBody = lenient(&body);
    if let Some(page) = body.page.as_deref() {
        debug!("Page view: {page}");
    }
    state.counters.record(VisitKind::PageView);
    Ok(Json(ApiResponse::ok("Page view tracked")))
}

async fn contact_form(State(state): State<AppState>) -> ApiResult {
    state.counters.record(VisitKind::ContactForm);
    Ok(Json(ApiResponse::ok("Contact form submission tracked")))
}

async fn resume_download(State(state): State<AppState>) -> ApiResult {
    state.counters.record(VisitKind::ResumeDownload);
    Ok(Json(ApiResponse::ok("Resume download tracked")))
}

async fn project_view(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let body: ProjectViewBody = lenient(&body);
    state
        .counters
        .record_project_view(body.project_id.as_deref())
        .map_err(|e| ApiError::new(e, "Failed to track analytics"))?;
    Ok(Json(ApiResponse::ok("Project view tracked")))
}

async fn stats(State(state): State<AppState>) -> ApiResult {
    let data = serde_json::to_value(state.counters.snapshot()).map_err(|e| {
        ApiError::new(
            AnalyticsError::Unexpected(e.to_string()),
            "Failed to fetch analytics",
        )
    })?;
    Ok(Json(ApiResponse::with_data(data)))
}

async fn submit_contact(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let submission: ContactSubmission = lenient(&body);
    state
        .relay
        .relay(&submission)
        .await
        .map_err(|e| ApiError::new(e, "Failed to send message. Please try again later."))?;
    Ok(Json(ApiResponse::ok(
        "Message sent successfully! I'll get back to you soon.",
    )))
}

async fn contact_health(State(state): State<AppState>) -> Response {
    match state.relay.health().await {
        Ok(()) => Json(ApiResponse::ok("Email service is working")).into_response(),
        Err(e) => {
            warn!("Mail health check failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure("Email service is unavailable")),
            )
                .into_response()
        },
    }
}
