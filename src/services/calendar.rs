use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use crate::models::EventRequest;

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Create the event and return a confirmation link when the backend
    /// provides one.
    async fn create_event(&self, event: &EventRequest) -> anyhow::Result<Option<String>>;
}

pub struct GoogleCalendarProvider {
    token: String,
    calendar_id: String,
    client: reqwest::Client,
}

impl GoogleCalendarProvider {
    pub fn new(token: String, calendar_id: String) -> Self {
        Self {
            token,
            calendar_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn create_event(&self, event: &EventRequest) -> anyhow::Result<Option<String>> {
        let url = format!(
            "https://www.googleapis.com/calendar/v3/calendars/{}/events",
            self.calendar_id
        );

        let body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": {
                "dateTime": event.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": event.timezone,
            },
            "end": {
                "dateTime": event.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": event.timezone,
            },
            "attendees": [{ "email": event.attendee_email }],
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("failed to call calendar API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse calendar response")?;

        if !status.is_success() {
            anyhow::bail!("calendar API error ({}): {}", status, data);
        }

        Ok(data["htmlLink"].as_str().map(|s| s.to_string()))
    }
}
