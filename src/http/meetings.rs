//! Native meeting endpoints.

use super::{status_for, AppState, ErrorBody};
use crate::error::ReferatError;
use crate::runner::TaskHandle;
use crate::storage::save_audio_file;
use crate::store::{ActionItem, Meeting, NewMeeting};
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_TITLE: &str = "Untitled Meeting";
const DEFAULT_LIST_LIMIT: usize = 50;

/// A meeting as returned over the API.
#[derive(Debug, Serialize)]
pub(crate) struct MeetingPayload {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub created_at: String,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub source_agent: Option<String>,
    pub error_message: Option<String>,
    pub action_items: Vec<ActionItemPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActionItemPayload {
    pub id: i64,
    pub description: String,
    pub owner: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
}

impl MeetingPayload {
    pub fn from_parts(meeting: Meeting, items: Vec<ActionItem>) -> Self {
        Self {
            id: meeting.id,
            title: meeting.title,
            status: meeting.status.to_string(),
            created_at: meeting.created_at.to_rfc3339(),
            audio_url: meeting.audio_url,
            transcript: meeting.transcript,
            summary: meeting.summary,
            source_agent: meeting.source_agent,
            error_message: meeting.error_message,
            action_items: items
                .into_iter()
                .map(|item| ActionItemPayload {
                    id: item.id,
                    description: item.description,
                    owner: item.owner,
                    due_date: item.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    status: item.status,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct CreateMeetingRequest {
    title: Option<String>,
    transcript: Option<String>,
    audio_url: Option<String>,
    source_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<usize>,
}

/// POST /meetings
///
/// Accepts either a JSON body (`title`, `transcript`, `audio_url`) or a
/// multipart form with an audio `file` part. The meeting is created in the
/// pending state and processing is handed to the job runner.
pub(crate) async fn create_meeting(State(state): State<AppState>, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let parsed = if is_multipart {
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => parse_multipart(&state, multipart).await,
            Err(e) => Err(ReferatError::Validation(e.to_string())),
        }
    } else {
        match Json::<CreateMeetingRequest>::from_request(request, &()).await {
            Ok(Json(body)) => Ok(NewMeeting {
                title: normalize_title(body.title),
                audio_url: body.audio_url.filter(|s| !s.trim().is_empty()),
                transcript: body.transcript.filter(|s| !s.trim().is_empty()),
                source_agent: body.source_agent.filter(|s| !s.trim().is_empty()),
            }),
            Err(e) => Err(ReferatError::Validation(e.to_string())),
        }
    };

    let new_meeting = match parsed {
        Ok(m) => m,
        Err(e) => return (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    };

    if new_meeting.transcript.is_none() && new_meeting.audio_url.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Provide a transcript or an audio file")),
        )
            .into_response();
    }

    let meeting_id = match state.orchestrator.store().create_meeting(&new_meeting) {
        Ok(id) => id,
        Err(e) => return (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    };

    info!("Created meeting {} ({})", meeting_id, new_meeting.title);

    let orchestrator = Arc::clone(&state.orchestrator);
    let handle = state
        .runner
        .submit(async move { orchestrator.process_meeting(meeting_id).await })
        .await;
    if let TaskHandle::Finished(Err(e)) = handle {
        // The failure is already recorded on the meeting; the caller sees it
        // in the returned record.
        warn!("Inline processing failed for meeting {}: {}", meeting_id, e);
    }

    match load_payload(&state, meeting_id) {
        Ok(Some(payload)) => (StatusCode::CREATED, Json(payload)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Meeting not found")),
        )
            .into_response(),
        Err(e) => (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    }
}

/// GET /meetings
pub(crate) async fn list_meetings(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let store = state.orchestrator.store();

    let meetings = match store.list_meetings(limit) {
        Ok(meetings) => meetings,
        Err(e) => return (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    };

    let mut payloads = Vec::with_capacity(meetings.len());
    for meeting in meetings {
        match store.action_items_for(meeting.id) {
            Ok(items) => payloads.push(MeetingPayload::from_parts(meeting, items)),
            Err(e) => {
                return (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response()
            }
        }
    }
    Json(payloads).into_response()
}

/// GET /meetings/{id}
pub(crate) async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match load_payload(&state, id) {
        Ok(Some(payload)) => Json(payload).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Meeting not found")),
        )
            .into_response(),
        Err(e) => (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    }
}

fn load_payload(state: &AppState, id: i64) -> crate::error::Result<Option<MeetingPayload>> {
    let store = state.orchestrator.store();
    let Some(meeting) = store.get_meeting(id)? else {
        return Ok(None);
    };
    let items = store.action_items_for(id)?;
    Ok(Some(MeetingPayload::from_parts(meeting, items)))
}

fn normalize_title(title: Option<String>) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

async fn parse_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> crate::error::Result<NewMeeting> {
    let mut title = None;
    let mut transcript = None;
    let mut audio_url = None;
    let mut uploaded_path = None;
    let mut source_agent = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReferatError::Validation(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "title" => {
                title = Some(text_field(field).await?);
            }
            "transcript" => {
                transcript = Some(text_field(field).await?);
            }
            "source_agent" => {
                source_agent = Some(text_field(field).await?);
            }
            "audio_url" => {
                audio_url = Some(text_field(field).await?);
            }
            "audio" => {
                let file_name = field.file_name().unwrap_or("upload.wav").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ReferatError::Validation(e.to_string()))?;
                if bytes.is_empty() {
                    continue;
                }
                let storage_dir = state.orchestrator.settings().storage_dir();
                let path = save_audio_file(&bytes, &file_name, &storage_dir).await?;
                uploaded_path = Some(path.to_string_lossy().into_owned());
            }
            _ => {}
        }
    }

    // An uploaded file wins over a pasted audio_url.
    Ok(NewMeeting {
        title: normalize_title(title),
        audio_url: uploaded_path.or(audio_url.filter(|s| !s.trim().is_empty())),
        transcript: transcript.filter(|s| !s.trim().is_empty()),
        source_agent: source_agent.filter(|s| !s.trim().is_empty()),
    })
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> crate::error::Result<String> {
    field
        .text()
        .await
        .map_err(|e| ReferatError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body_json, test_state};
    use super::super::router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn json_request(body: &str) -> Request<Body> {
        Request::post("/meetings")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_meeting_with_transcript() {
        let state = test_state();
        let app = router(state);
        let response = app
            .oneshot(json_request(
                r#"{"title": "Sync", "transcript": "We agreed on the plan. ACTION: ship it @Bob"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Sync");
        assert_eq!(body["status"], "done");
        assert!(body["summary"].as_str().unwrap().starts_with("We agreed"));
        assert_eq!(body["action_items"][0]["description"], "ship it");
    }

    #[tokio::test]
    async fn test_create_meeting_without_input_is_rejected() {
        let state = test_state();
        let store = std::sync::Arc::clone(state.orchestrator.store());
        let app = router(state);
        let response = app.oneshot(json_request(r#"{"title": "Sync"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Provide a transcript or an audio file");
        // No record is created for a rejected request.
        assert!(store.list_meetings(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_meeting_defaults_title() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                r#"{"transcript": "A transcript with enough characters."}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Untitled Meeting");
    }

    #[tokio::test]
    async fn test_short_transcript_returns_failed_record() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(r#"{"transcript": "hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "failed");
        assert!(body["error_message"]
            .as_str()
            .unwrap()
            .contains("too short"));
    }

    #[tokio::test]
    async fn test_get_missing_meeting() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/meetings/999").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Meeting not found");
    }

    #[tokio::test]
    async fn test_list_meetings() {
        let app = router(test_state());
        let _ = app
            .clone()
            .oneshot(json_request(
                r#"{"title": "First", "transcript": "A transcript with enough characters."}"#,
            ))
            .await
            .unwrap();
        let response = app
            .oneshot(Request::get("/meetings").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "First");
    }
}
