//! HTTP surface: native REST endpoints plus the Supervisor protocol adapter.

mod agents;
mod meetings;
mod supervisor;

use crate::error::ReferatError;
use crate::orchestrator::Orchestrator;
use crate::runner::TaskRunner;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Uploads larger than this are rejected (100 MiB).
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub runner: TaskRunner,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/meetings",
            get(meetings::list_meetings).post(meetings::create_meeting),
        )
        .route("/meetings/{id}", get(meetings::get_meeting))
        .route("/agents/meeting-followup", post(agents::meeting_followup))
        .route(
            "/agents/supervisor/meeting-followup",
            post(supervisor::meeting_followup),
        )
        .route("/agents/supervisor/health", get(supervisor::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// JSON error payload shared by the native endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Map a pipeline error to an HTTP status.
pub(crate) fn status_for(err: &ReferatError) -> StatusCode {
    match err {
        ReferatError::Validation(_) => StatusCode::BAD_REQUEST,
        ReferatError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_items::RuleBasedExtractor;
    use crate::config::Settings;
    use crate::store::MeetingStore;
    use crate::summarize::MockSummarizer;
    use crate::transcription::MockTranscriber;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    pub(crate) fn test_state() -> AppState {
        let mut settings = Settings::default();
        settings.jobs.enabled = false;
        let orchestrator = Arc::new(Orchestrator::with_components(
            settings.clone(),
            Arc::new(MeetingStore::in_memory().unwrap()),
            Arc::new(MockTranscriber),
            Arc::new(MockSummarizer),
            Arc::new(RuleBasedExtractor::new()),
        ));
        AppState {
            orchestrator,
            runner: TaskRunner::new(&settings.jobs),
        }
    }

    pub(crate) async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        assert_eq!(
            status_for(&ReferatError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ReferatError::NotFound("gone".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ReferatError::Upstream("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
