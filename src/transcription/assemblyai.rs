//! AssemblyAI transcription provider.
//!
//! API flow: upload the local file (unless the reference is already a URL),
//! submit a transcription job, then poll until the job completes, errors, or
//! the wall-clock timeout is hit.

use super::{looks_like_url, Transcriber};
use crate::config::AssemblyAiSettings;
use crate::error::{ReferatError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument};

/// Upload chunk size: the file is streamed, never buffered whole.
const UPLOAD_CHUNK_BYTES: usize = 5 * 1024 * 1024;

/// AssemblyAI remote-job transcriber.
pub struct AssemblyAiTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: Option<String>,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl AssemblyAiTranscriber {
    /// Create a new transcriber. A missing API key is reported at call time,
    /// not construction time.
    pub fn new(settings: &AssemblyAiSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: settings.api_key.trim().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            poll_interval: Duration::from_secs_f64(settings.poll_interval_secs),
            poll_timeout: Duration::from_secs_f64(settings.poll_timeout_secs),
        }
    }

    /// Upload a local audio file in fixed-size chunks, returning the upload URL.
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn upload_file(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ReferatError::Validation(format!(
                "Audio file not found: {}",
                path.display()
            )));
        }

        let file = tokio::fs::File::open(path).await?;
        let chunks = futures::stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK_BYTES];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                Ok::<Option<(Vec<u8>, tokio::fs::File)>, std::io::Error>(None)
            } else {
                buf.truncate(read);
                Ok(Some((buf, file)))
            }
        });

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(reqwest::Body::wrap_stream(chunks))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReferatError::Upstream(format!("Upload failed: {}", body)));
        }

        let upload: UploadResponse = response.json().await?;
        if upload.upload_url.is_empty() {
            return Err(ReferatError::Upstream(
                "Upload response missing 'upload_url'".to_string(),
            ));
        }

        debug!("Uploaded audio file");
        Ok(upload.upload_url)
    }

    /// Submit a transcription job for an audio URL, returning the job id.
    async fn request_transcription(&self, audio_url: &str, model: Option<&str>) -> Result<String> {
        let request_body = JobRequest {
            audio_url: audio_url.to_string(),
            model: model.map(|m| m.to_string()),
        };

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReferatError::Upstream(format!(
                "Transcription request failed: {}",
                body
            )));
        }

        let job: JobResponse = response.json().await?;
        if job.id.is_empty() {
            return Err(ReferatError::Upstream(
                "Transcription response missing 'id'".to_string(),
            ));
        }

        debug!("Submitted transcription job {}", job.id);
        Ok(job.id)
    }

    /// Poll a job until it completes, errors, or the timeout ceiling passes.
    /// Unrecognized statuses keep polling.
    #[instrument(skip(self))]
    async fn poll_transcription(&self, job_id: &str) -> Result<String> {
        let started = Instant::now();
        let url = format!("{}/transcript/{}", self.base_url, job_id);

        loop {
            let response = self
                .client
                .get(&url)
                .header("authorization", &self.api_key)
                .send()
                .await?;

            if !response.status().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ReferatError::Upstream(format!("Polling failed: {}", body)));
            }

            let job: JobResponse = response.json().await?;
            match job.status.as_str() {
                "completed" => {
                    let text = job.text.unwrap_or_default().trim().to_string();
                    if text.is_empty() {
                        return Err(ReferatError::Upstream(
                            "AssemblyAI returned an empty transcript".to_string(),
                        ));
                    }
                    return Ok(text);
                }
                "error" => {
                    return Err(ReferatError::Upstream(
                        job.error
                            .unwrap_or_else(|| "AssemblyAI reported an error".to_string()),
                    ));
                }
                status => {
                    debug!("Transcription job {} status: {}", job_id, status);
                }
            }

            if started.elapsed() > self.poll_timeout {
                return Err(ReferatError::Upstream("Polling timed out".to_string()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    async fn transcribe(&self, audio_ref: &str, model: Option<&str>) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(ReferatError::Capability(
                "ASSEMBLYAI_API_KEY is required for transcription".to_string(),
            ));
        }

        let audio_source = if looks_like_url(audio_ref) {
            audio_ref.to_string()
        } else {
            self.upload_file(Path::new(audio_ref)).await?
        };

        let model = model.or(self.model.as_deref());
        let job_id = self.request_transcription(&audio_source, model).await?;
        let text = self.poll_transcription(&job_id).await?;

        info!("Transcription completed ({} characters)", text.len());
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct JobRequest {
    audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    text: Option<String>,
    error: Option<String>,
}
