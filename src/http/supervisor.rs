//! Supervisor protocol adapter.
//!
//! The Supervisor orchestrator speaks a fixed request/response envelope and
//! expects every outcome, including validation failures, wrapped in it. Audio
//! arrives inline as base64 in the input metadata and is transcribed before
//! the follow-up pipeline runs; the rendered result is markdown.

use super::AppState;
use crate::action_items::ActionItemDraft;
use crate::error::{ReferatError, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::io::Write;
use tracing::{info, warn};

/// Transcripts shorter than this produce a validation error envelope rather
/// than a useless one-line summary.
const MIN_TRANSCRIPT_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
struct SupervisorRequest {
    input: AgentInput,
}

#[derive(Debug, Deserialize)]
struct AgentInput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct SupervisorResponse {
    request_id: String,
    agent_name: String,
    status: String,
    output: Option<AgentOutput>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Serialize)]
struct AgentOutput {
    result: String,
    confidence: f64,
    details: String,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// POST /agents/supervisor/meeting-followup
pub(crate) async fn meeting_followup(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Response {
    // Recover correlation fields even when the envelope itself is malformed.
    let request_id = raw
        .get("request_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let agent_name = raw
        .get("agent_name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| state.orchestrator.settings().supervisor.agent_name.clone());

    let request: SupervisorRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            return error_envelope(
                StatusCode::BAD_REQUEST,
                request_id,
                agent_name,
                "validation_error",
                format!("Invalid request format: {}", e),
            );
        }
    };
    let metadata = request.input.metadata.unwrap_or_default();

    let mut text = request.input.text.unwrap_or_default();

    // Inline audio takes precedence: when present, the text field is usually
    // just the user's query ("summarize this meeting"), not the transcript.
    if let Some(encoded) = metadata.get("file_base64").and_then(Value::as_str) {
        let mime_type = metadata
            .get("mime_type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if mime_type.starts_with("audio/") {
            let filename = metadata
                .get("filename")
                .and_then(Value::as_str)
                .unwrap_or("audio.mp3");
            match transcribe_inline_audio(&state, encoded, filename).await {
                Ok(transcript) => text = transcript,
                Err(e) => {
                    return error_envelope(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        request_id,
                        agent_name,
                        "transcription_error",
                        format!("Failed to process audio file: {}", e),
                    );
                }
            }
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return error_envelope(
            StatusCode::BAD_REQUEST,
            request_id,
            agent_name,
            "validation_error",
            "Transcript text is required in input.text field, or provide an audio file in metadata"
                .to_string(),
        );
    }
    let char_count = text.chars().count();
    if char_count < MIN_TRANSCRIPT_CHARS {
        return error_envelope(
            StatusCode::BAD_REQUEST,
            request_id,
            agent_name,
            "validation_error",
            format!(
                "Transcript is too short ({} characters). Need at least {} characters.",
                char_count, MIN_TRANSCRIPT_CHARS
            ),
        );
    }

    let follow_up = match state.orchestrator.follow_up(&text).await {
        Ok(result) => result,
        Err(e) => {
            let kind = match &e {
                ReferatError::Summarization(_) => "summarization_error",
                ReferatError::ActionExtraction(_) => "action_extraction_error",
                _ => "internal_error",
            };
            return error_envelope(
                StatusCode::INTERNAL_SERVER_ERROR,
                request_id,
                agent_name,
                kind,
                e.to_string(),
            );
        }
    };

    let metadata = clean_metadata(metadata);
    let markdown = render_markdown(&follow_up.summary, &follow_up.action_items, &metadata);
    let item_count = follow_up.action_items.len();
    info!("Supervisor follow-up generated with {} action items", item_count);

    let response = SupervisorResponse {
        request_id,
        agent_name,
        status: "success".to_string(),
        output: Some(AgentOutput {
            result: markdown,
            confidence: 0.9,
            details: format!(
                "Generated summary and {} action items from meeting transcript",
                item_count
            ),
        }),
        error: None,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /agents/supervisor/health
pub(crate) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agent": state.orchestrator.settings().supervisor.agent_name,
        "capabilities": ["meeting.followup"],
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn transcribe_inline_audio(
    state: &AppState,
    encoded: &str,
    filename: &str,
) -> Result<String> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ReferatError::Validation(format!("Invalid base64 audio: {}", e)))?;

    let suffix = std::path::Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".mp3".to_string());

    // The temp file is removed when it drops, success or failure.
    let mut file = tempfile::Builder::new()
        .prefix("supervisor-audio-")
        .suffix(&suffix)
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;

    let path = file.path().to_string_lossy().into_owned();
    state.orchestrator.transcriber().transcribe(&path, None).await
}

/// Strip the inline audio payload before using metadata for display.
fn clean_metadata(mut metadata: Map<String, Value>) -> Map<String, Value> {
    metadata.remove("file_base64");
    metadata
}

/// Render the follow-up as markdown for display in the Supervisor UI.
/// Items are grouped by status in a fixed order; unknown statuses are dropped.
fn render_markdown(
    summary: &str,
    items: &[ActionItemDraft],
    metadata: &Map<String, Value>,
) -> String {
    let title = metadata
        .get("filename")
        .and_then(Value::as_str)
        .unwrap_or("Meeting");

    let mut lines = vec![
        format!("# {}\n", title),
        "## Summary\n".to_string(),
        format!("{}\n", summary),
        "## Action Items\n".to_string(),
    ];

    if items.is_empty() {
        lines.push("*No action items identified*\n".to_string());
    } else {
        let groups = [
            ("To Do", "📌"),
            ("In Progress", "🔄"),
            ("Done", "✅"),
            ("pending", "📌"),
        ];
        for (status, emoji) in groups {
            let group: Vec<&ActionItemDraft> =
                items.iter().filter(|item| item.status == status).collect();
            if group.is_empty() {
                continue;
            }
            lines.push(format!("\n### {} {}\n", emoji, status));
            for item in group {
                let mut line = format!("- **{}**", item.description);
                if let Some(owner) = &item.owner {
                    line.push_str(&format!(" (👤 {})", owner));
                }
                if let Some(due) = &item.due_date {
                    line.push_str(&format!(" (📅 {})", due));
                }
                lines.push(line);
            }
        }
    }

    if !metadata.is_empty() {
        lines.push("\n---\n".to_string());
        lines.push("### ℹ Info\n".to_string());
        if let Some(language) = metadata.get("language").and_then(Value::as_str) {
            lines.push(format!("- **Language:** {}", language));
        }
        if let Some(mime_type) = metadata.get("mime_type").and_then(Value::as_str) {
            lines.push(format!("- **Type:** {}", mime_type));
        }
    }

    lines.join("\n")
}

fn error_envelope(
    status: StatusCode,
    request_id: String,
    agent_name: String,
    kind: &str,
    message: String,
) -> Response {
    warn!("Supervisor request {} failed: {}", request_id, message);
    let response = SupervisorResponse {
        request_id,
        agent_name,
        status: "error".to_string(),
        output: None,
        error: Some(ErrorDetail {
            kind: kind.to_string(),
            message,
        }),
    };
    (status, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_json, test_state};
    use super::super::router;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn supervisor_request(body: String) -> Request<Body> {
        Request::post("/agents/supervisor/meeting-followup")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_envelope() {
        let app = router(test_state());
        let body = json!({
            "request_id": "req-1",
            "agent_name": "meeting_followup_agent",
            "input": {
                "text": "We reviewed the quarterly roadmap in detail. ACTION: send notes @Carol (due 2023-12-01)",
                "metadata": {"language": "en", "filename": "roadmap.mp3"}
            }
        });
        let response = app
            .oneshot(supervisor_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["request_id"], "req-1");
        assert_eq!(body["agent_name"], "meeting_followup_agent");
        assert_eq!(body["status"], "success");
        assert!(body["error"].is_null());
        let result = body["output"]["result"].as_str().unwrap();
        assert!(result.starts_with("# roadmap.mp3"));
        assert!(result.contains("## Summary"));
        assert!(result.contains("send notes"));
        assert!(body["output"]["details"]
            .as_str()
            .unwrap()
            .contains("1 action items"));
    }

    #[tokio::test]
    async fn test_short_text_gets_validation_envelope() {
        let app = router(test_state());
        let body = json!({
            "request_id": "req-2",
            "input": {"text": "too short"}
        });
        let response = app
            .oneshot(supervisor_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["request_id"], "req-2");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["type"], "validation_error");
        assert!(body["output"].is_null());
    }

    #[tokio::test]
    async fn test_multibyte_short_text_is_rejected() {
        let app = router(test_state());
        // 30 characters but 60 UTF-8 bytes; the floor counts characters.
        let body = json!({
            "request_id": "req-5",
            "input": {"text": "ü".repeat(30)}
        });
        let response = app
            .oneshot(supervisor_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["type"], "validation_error");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("30 characters"));
    }

    #[tokio::test]
    async fn test_missing_input_recovers_request_id() {
        let app = router(test_state());
        let response = app
            .oneshot(supervisor_request(
                json!({"request_id": "req-3"}).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["request_id"], "req-3");
        // No agent_name in the request either, so the configured one is used.
        assert_eq!(body["agent_name"], "meeting_followup_agent");
        assert_eq!(body["error"]["type"], "validation_error");
    }

    #[tokio::test]
    async fn test_invalid_base64_audio() {
        let app = router(test_state());
        let body = json!({
            "request_id": "req-4",
            "input": {
                "metadata": {"file_base64": "!!! not base64 !!!", "mime_type": "audio/mpeg"}
            }
        });
        let response = app
            .oneshot(supervisor_request(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "transcription_error");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to process audio file"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::get("/agents/supervisor/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["agent"], "meeting_followup_agent");
        assert_eq!(body["capabilities"][0], "meeting.followup");
    }

    #[test]
    fn test_render_markdown_groups_by_status() {
        let mut pending = ActionItemDraft::new("Send deck");
        pending.owner = Some("Alice".to_string());
        pending.due_date = Some("2023-12-01".to_string());
        let mut done = ActionItemDraft::new("Close tickets");
        done.status = "Done".to_string();
        let mut unknown = ActionItemDraft::new("Mystery task");
        unknown.status = "archived".to_string();

        let mut metadata = Map::new();
        metadata.insert("filename".to_string(), json!("standup.mp3"));
        metadata.insert("mime_type".to_string(), json!("audio/mpeg"));

        let markdown = render_markdown("A good meeting.", &[pending, done, unknown], &metadata);
        assert!(markdown.starts_with("# standup.mp3"));
        assert!(markdown.contains("A good meeting."));
        assert!(markdown.contains("### 📌 pending"));
        assert!(markdown.contains("- **Send deck** (👤 Alice) (📅 2023-12-01)"));
        assert!(markdown.contains("### ✅ Done"));
        assert!(markdown.contains("- **Close tickets**"));
        // Unrecognized statuses never reach the rendered view.
        assert!(!markdown.contains("Mystery task"));
        assert!(markdown.contains("- **Type:** audio/mpeg"));
    }

    #[test]
    fn test_render_markdown_without_items() {
        let markdown = render_markdown("Summary.", &[], &Map::new());
        assert!(markdown.contains("*No action items identified*"));
        assert!(markdown.starts_with("# Meeting"));
        assert!(!markdown.contains("Info"));
    }
}
