use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::calendar::CalendarProvider;
use crate::services::recordings::RecordingFetcher;
use crate::services::sessions::SessionStore;
use crate::services::transcribe::TranscriptionProvider;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
    pub llm: Box<dyn LlmProvider>,
    pub transcriber: Box<dyn TranscriptionProvider>,
    pub recordings: Box<dyn RecordingFetcher>,
    pub calendar: Box<dyn CalendarProvider>,
}
