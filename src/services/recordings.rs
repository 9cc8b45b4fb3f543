use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

const MAX_FETCH_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 500;

#[async_trait]
pub trait RecordingFetcher: Send + Sync {
    /// Download the audio bytes for a recording reference.
    async fn fetch(&self, recording_url: &str) -> anyhow::Result<Vec<u8>>;
}

/// Fetches Twilio call recordings with basic auth. The clip is not always
/// provisioned by the time the turn webhook fires, so a 404 is retried with
/// exponential backoff up to a bounded number of attempts.
pub struct TwilioRecordingFetcher {
    account_sid: String,
    auth_token: String,
    client: reqwest::Client,
}

impl TwilioRecordingFetcher {
    pub fn new(account_sid: String, auth_token: String) -> Self {
        Self {
            account_sid,
            auth_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RecordingFetcher for TwilioRecordingFetcher {
    async fn fetch(&self, recording_url: &str) -> anyhow::Result<Vec<u8>> {
        let url = format!("{recording_url}.mp3");
        let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);

        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            let resp = self
                .client
                .get(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .send()
                .await
                .context("failed to request recording")?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                // Not provisioned yet
                tracing::debug!(url = %url, attempt, "recording not ready, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            let resp = resp.error_for_status().context("recording fetch failed")?;
            let bytes = resp.bytes().await.context("failed to read recording body")?;
            return Ok(bytes.to_vec());
        }

        anyhow::bail!("recording never became available after {MAX_FETCH_ATTEMPTS} attempts")
    }
}
