/// Failures that abort a single turn. Each maps to the same generic spoken
/// apology at the webhook boundary; the variant only drives logging.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no recording reference on turn event")]
    MissingRecording,

    #[error("recording not available: {0}")]
    RecordingFetch(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("AI provider error: {0}")]
    Ai(String),
}
