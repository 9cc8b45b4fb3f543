use anyhow::Context;
use async_trait::async_trait;

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe recorded audio to text. Silence comes back as an empty or
    /// near-empty string, never as an error.
    async fn transcribe(&self, audio: Vec<u8>) -> anyhow::Result<String>;
}

/// OpenAI Whisper over the audio transcriptions endpoint.
pub struct OpenAiTranscriber {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAiTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> anyhow::Result<String> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("recording.mp3")
            .mime_str("audio/mpeg")
            .context("invalid audio mime type")?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", part);

        let resp = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("failed to call transcription API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("transcription API error ({status}): {body}");
        }

        Ok(resp
            .text()
            .await
            .context("failed to read transcription body")?
            .trim()
            .to_string())
    }
}
