//! Native agent endpoint: stateless follow-up generation.

use super::{status_for, AppState, ErrorBody};
use crate::action_items::ActionItemDraft;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct FollowupRequest {
    transcript: Option<String>,
    metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FollowupResponse {
    summary: String,
    action_items: Vec<ActionItemDraft>,
    metadata: Value,
}

/// POST /agents/meeting-followup
///
/// Runs summarization and extraction on the supplied transcript without
/// creating a meeting record. Metadata is echoed back untouched.
pub(crate) async fn meeting_followup(
    State(state): State<AppState>,
    Json(request): Json<FollowupRequest>,
) -> Response {
    let transcript = request
        .transcript
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if transcript.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("transcript is required")),
        )
            .into_response();
    }

    match state.orchestrator.follow_up(transcript).await {
        Ok(result) => Json(FollowupResponse {
            summary: result.summary,
            action_items: result.action_items,
            metadata: request.metadata.unwrap_or_else(|| Value::Object(Default::default())),
        })
        .into_response(),
        Err(e) => (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_json, test_state};
    use super::super::router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn followup_request(body: &str) -> Request<Body> {
        Request::post("/agents/meeting-followup")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_followup_returns_summary_and_items() {
        let app = router(test_state());
        let response = app
            .oneshot(followup_request(
                r#"{"transcript": "We met. ACTION: send notes @Carol", "metadata": {"lang": "en"}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["summary"].as_str().unwrap().starts_with("We met"));
        assert_eq!(body["action_items"][0]["description"], "send notes");
        assert_eq!(body["action_items"][0]["owner"], "Carol");
        assert_eq!(body["metadata"]["lang"], "en");
    }

    #[tokio::test]
    async fn test_missing_transcript_is_rejected() {
        let app = router(test_state());
        let response = app.oneshot(followup_request(r#"{}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "transcript is required");
    }

    #[tokio::test]
    async fn test_blank_transcript_is_rejected() {
        let app = router(test_state());
        let response = app
            .oneshot(followup_request(r#"{"transcript": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
