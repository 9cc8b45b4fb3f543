use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub openai_api_key: String,
    pub chat_model: String,
    pub transcribe_model: String,
    pub calendar_id: String,
    pub calendar_token: String,
    pub timezone: String,
    pub booking_duration_minutes: i64,
    pub max_commit_attempts: u32,
    pub session_idle_minutes: i64,
    pub record_max_seconds: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            transcribe_model: env::var("TRANSCRIBE_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            calendar_id: env::var("CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            calendar_token: env::var("CALENDAR_TOKEN").unwrap_or_default(),
            timezone: env::var("BOOKING_TIMEZONE")
                .unwrap_or_else(|_| "America/New_York".to_string()),
            booking_duration_minutes: env::var("BOOKING_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            max_commit_attempts: env::var("MAX_COMMIT_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            record_max_seconds: env::var("RECORD_MAX_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        }
    }
}
