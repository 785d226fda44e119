use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};

use crate::types::TranscriptionResponse;
use crate::{LocalModelError, Result};

/// Client for a Whisper-compatible speech-to-text server.
///
/// Works with whisper.cpp's `/inference` endpoint and with OpenAI-style
/// `/v1/audio/transcriptions` endpoints: both accept a multipart `file`
/// upload and answer with `{"text": ...}` when `response_format=json`.
#[derive(Debug, Clone)]
pub struct WhisperClient {
    http: reqwest::Client,
    url: String,
    model: Option<String>,
}

impl WhisperClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            url: url.into(),
            model: None,
        })
    }

    /// Model name sent as the `model` form field (needed by OpenAI-style servers).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Upload the audio file at `path` and return the trimmed transcript.
    pub async fn transcribe(&self, path: &Path, language: Option<&str>) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());
        tracing::debug!(url = %self.url, bytes = data.len(), "uploading audio for transcription");

        let part = Part::bytes(data).file_name(file_name).mime_str("audio/wav")?;
        let mut form = Form::new()
            .part("file", part)
            .text("response_format", "json");
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }
        if let Some(model) = &self.model {
            form = form.text("model", model.clone());
        }

        let response = self.http.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LocalModelError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: TranscriptionResponse =
            serde_json::from_str(&body).map_err(|source| LocalModelError::Parse {
                line: body.clone(),
                source,
            })?;
        Ok(parsed.transcript())
    }
}
