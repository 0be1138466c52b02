use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::core::config::SpeechConfig;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("nothing to speak")]
    EmptyText,
    #[error("speech API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("speech API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("writing audio to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` as audio into `out_path`.
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), SpeechError>;
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// The hosted `audio/speech` endpoint, producing MP3.
pub struct OpenAiSpeech {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(
        api_key: String,
        base_url: String,
        config: &SpeechConfig,
        request_timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            voice: config.voice.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model: &self.model,
                voice: &self.voice,
                input: text,
                response_format: "mp3",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        tokio::fs::write(out_path, &audio)
            .await
            .map_err(|source| SpeechError::Write {
                path: out_path.to_path_buf(),
                source,
            })?;
        info!("Wrote {} bytes of audio to {}", audio.len(), out_path.display());
        Ok(())
    }
}
