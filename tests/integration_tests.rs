use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use frontdesk::config::AppConfig;
use frontdesk::handlers;
use frontdesk::models::{DialogueState, EventRequest};
use frontdesk::services::ai::{LlmProvider, Message};
use frontdesk::services::calendar::CalendarProvider;
use frontdesk::services::recordings::RecordingFetcher;
use frontdesk::services::sessions::SessionStore;
use frontdesk::services::transcribe::TranscriptionProvider;
use frontdesk::state::AppState;

// ── Mock Providers ──

struct MockLlm;

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");

        if system_prompt.contains("field extraction engine") {
            // Deterministic extraction keyed on utterance content
            if last.contains("gel manicure") {
                Ok(r#"{"service":"Gel Manicure","date":"2024-06-01","time":"14:00","email":"a@b.com"}"#.to_string())
            } else if last.contains("silk press") {
                Ok(r#"{"service":"Silk Press","date":null,"time":null,"email":null}"#.to_string())
            } else if last.contains("a@b.com") {
                Ok(r#"{"service":null,"date":"2024-06-01","time":"14:00","email":"a@b.com"}"#
                    .to_string())
            } else {
                Ok(r#"{"service":null,"date":null,"time":null,"email":null}"#.to_string())
            }
        } else if last.contains("hours") {
            Ok("We're open Monday through Wednesday from ten to six.".to_string())
        } else {
            Ok("Of course! What date and time would you like, and what's your email address?"
                .to_string())
        }
    }
}

/// Hands the recording URL bytes straight through so the mock transcriber can
/// key its transcript on it.
struct MockRecordings;

#[async_trait]
impl RecordingFetcher for MockRecordings {
    async fn fetch(&self, recording_url: &str) -> anyhow::Result<Vec<u8>> {
        Ok(recording_url.as_bytes().to_vec())
    }
}

struct MockTranscriber;

#[async_trait]
impl TranscriptionProvider for MockTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> anyhow::Result<String> {
        let url = String::from_utf8(audio)?;
        let transcript = if url.ends_with("rec-booking") {
            "I'd like a gel manicure on 2024-06-01 at 2pm, email me at a@b.com"
        } else if url.ends_with("rec-partial") {
            "book me a silk press"
        } else if url.ends_with("rec-rest") {
            "June first at 2pm, my email is a@b.com"
        } else if url.ends_with("rec-silence") {
            " ... "
        } else if url.ends_with("rec-exit") {
            "no thanks, goodbye"
        } else if url.ends_with("rec-hours") {
            "what are your hours?"
        } else {
            "hello there"
        };
        Ok(transcript.to_string())
    }
}

struct MockCalendar {
    created: Arc<Mutex<Vec<EventRequest>>>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn create_event(&self, event: &EventRequest) -> anyhow::Result<Option<String>> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("calendar backend unavailable");
        }
        self.created.lock().unwrap().push(event.clone());
        Ok(Some("https://calendar.example/event/1".to_string()))
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 5000,
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(), // empty = skip signature validation
        openai_api_key: "test-key".to_string(),
        chat_model: "gpt-4".to_string(),
        transcribe_model: "whisper-1".to_string(),
        calendar_id: "primary".to_string(),
        calendar_token: "test-token".to_string(),
        timezone: "America/New_York".to_string(),
        booking_duration_minutes: 30,
        max_commit_attempts: 3,
        session_idle_minutes: 15,
        record_max_seconds: 20,
    }
}

fn test_state_with(
    config: AppConfig,
) -> (Arc<AppState>, Arc<Mutex<Vec<EventRequest>>>, Arc<AtomicBool>) {
    let created = Arc::new(Mutex::new(vec![]));
    let fail = Arc::new(AtomicBool::new(false));
    let calendar = MockCalendar {
        created: Arc::clone(&created),
        fail: Arc::clone(&fail),
    };
    let state = Arc::new(AppState {
        sessions: SessionStore::new(config.session_idle_minutes),
        config,
        llm: Box::new(MockLlm),
        transcriber: Box::new(MockTranscriber),
        recordings: Box::new(MockRecordings),
        calendar: Box::new(calendar),
    });
    (state, created, fail)
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<EventRequest>>>, Arc<AtomicBool>) {
    test_state_with(test_config())
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/voice", post(handlers::voice::call_start))
        .route("/process", post(handlers::voice::process_turn))
        .with_state(state)
}

fn turn_request(call_sid: &str, recording: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "CallSid={call_sid}&RecordingUrl=https%3A%2F%2Fapi.example%2F{recording}"
        )))
        .unwrap()
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn run_turn(state: &Arc<AppState>, call_sid: &str, recording: &str) -> String {
    let app = test_app(Arc::clone(state));
    let res = app.oneshot(turn_request(call_sid, recording)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_text(res).await
}

// ── Health Check ──

#[tokio::test]
async fn test_health() {
    let (state, _, _) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

// ── Call Start ──

#[tokio::test]
async fn test_call_start_greets_and_records() {
    let (state, _, _) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/voice")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from("CallSid=CA1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/xml"
    );
    let xml = body_text(res).await;
    assert!(xml.contains("Welcome to Nova Salon"));
    assert!(xml.contains(r#"<Record action="/process""#));
    assert!(xml.contains(r##"finishOnKey="#""##));
}

// ── Turn Error Handling ──

#[tokio::test]
async fn test_missing_recording_apologizes() {
    let (state, created, _) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from("CallSid=CA1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let xml = body_text(res).await;
    assert!(xml.contains("Sorry, something went wrong"));
    assert!(!xml.contains("<Record"));
    assert!(created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_silence_reprompts_and_redirects() {
    let (state, created, _) = test_state();

    let xml = run_turn(&state, "CA1", "rec-silence").await;
    assert!(xml.contains("didn't catch that"));
    assert!(xml.contains("<Redirect>/voice</Redirect>"));
    // No LLM work and no session for a silent turn
    assert!(state.sessions.get("CA1").is_none());
    assert!(created.lock().unwrap().is_empty());
}

// ── Booking Flow ──

#[tokio::test]
async fn test_complete_booking_in_one_turn() {
    let (state, created, _) = test_state();

    let xml = run_turn(&state, "CA1", "rec-booking").await;

    let events = created.lock().unwrap();
    assert_eq!(events.len(), 1, "committer should be invoked exactly once");
    assert_eq!(events[0].summary, "Gel Manicure");
    assert_eq!(
        events[0].start.format("%Y-%m-%d %H:%M").to_string(),
        "2024-06-01 14:00"
    );
    assert_eq!(events[0].attendee_email, "a@b.com");

    assert!(xml.contains("booked"), "reply should confirm, got: {xml}");
    assert!(xml.contains("<Record"), "call should re-offer a listen");
    assert!(
        state.sessions.get("CA1").is_none(),
        "session must be deleted after a successful commit"
    );
}

#[tokio::test]
async fn test_partial_booking_collects_more_info() {
    let (state, created, _) = test_state();

    let xml = run_turn(&state, "CA1", "rec-partial").await;

    assert!(created.lock().unwrap().is_empty(), "no commit on incomplete record");
    let session = state.sessions.get("CA1").expect("session should exist");
    assert_eq!(session.fields.service.as_deref(), Some("Silk Press"));
    assert!(!session.fields.is_complete());
    assert_eq!(session.state, DialogueState::Collecting);
    assert!(xml.contains("<Record"), "should record another turn");
}

#[tokio::test]
async fn test_fields_accumulate_across_turns() {
    let (state, created, _) = test_state();

    run_turn(&state, "CA1", "rec-partial").await;
    let xml = run_turn(&state, "CA1", "rec-rest").await;

    let events = created.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].summary, "Silk Press");
    assert_eq!(events[0].attendee_email, "a@b.com");
    assert!(xml.contains("booked"));
    assert!(state.sessions.get("CA1").is_none());
}

#[tokio::test]
async fn test_commit_failure_preserves_session() {
    let (state, created, fail) = test_state();
    fail.store(true, Ordering::SeqCst);

    let xml = run_turn(&state, "CA1", "rec-booking").await;

    assert!(created.lock().unwrap().is_empty());
    assert!(xml.contains("kept your details"), "got: {xml}");
    assert!(xml.contains("<Record"), "call should continue after failure");

    let session = state.sessions.get("CA1").expect("session must survive a failed commit");
    assert!(session.fields.is_complete(), "fields must be unchanged");
    assert_eq!(session.commit_attempts, 1);
}

#[tokio::test]
async fn test_commit_gives_up_after_attempt_cap() {
    let mut config = test_config();
    config.max_commit_attempts = 2;
    let (state, _, fail) = test_state_with(config);
    fail.store(true, Ordering::SeqCst);

    run_turn(&state, "CA1", "rec-booking").await;
    assert!(state.sessions.get("CA1").is_some());

    let xml = run_turn(&state, "CA1", "rec-booking").await;
    assert!(xml.contains("call back later"), "got: {xml}");
    assert!(
        state.sessions.get("CA1").is_none(),
        "session should be released once the cap is reached"
    );
}

#[tokio::test]
async fn test_retry_succeeds_after_transient_failure() {
    let (state, created, fail) = test_state();

    fail.store(true, Ordering::SeqCst);
    run_turn(&state, "CA1", "rec-booking").await;

    fail.store(false, Ordering::SeqCst);
    let xml = run_turn(&state, "CA1", "rec-booking").await;

    assert_eq!(created.lock().unwrap().len(), 1);
    assert!(xml.contains("booked"));
    assert!(state.sessions.get("CA1").is_none());
}

// ── Dialogue Policy ──

#[tokio::test]
async fn test_exit_hangs_up_and_drops_session() {
    let (state, created, _) = test_state();

    run_turn(&state, "CA1", "rec-partial").await;
    assert!(state.sessions.get("CA1").is_some());

    // Exit intent wins even though the session is still incomplete
    let xml = run_turn(&state, "CA1", "rec-exit").await;
    assert!(xml.contains("<Hangup/>"));
    assert!(xml.contains("Goodbye"));
    assert!(state.sessions.get("CA1").is_none());
    assert!(created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_general_question_stays_listening() {
    let (state, created, _) = test_state();

    let xml = run_turn(&state, "CA1", "rec-hours").await;

    assert!(xml.contains("ten to six"), "got: {xml}");
    assert!(xml.contains("<Record"));
    assert!(created.lock().unwrap().is_empty());
    assert!(
        state.sessions.get("CA1").is_none(),
        "a pure information call never allocates a session"
    );
}

// ── Webhook Auth ──

#[tokio::test]
async fn test_unsigned_webhook_rejected_when_token_set() {
    let mut config = test_config();
    config.twilio_auth_token = "secret".to_string();
    let (state, _, _) = test_state_with(config);
    let app = test_app(state);

    let res = app.oneshot(turn_request("CA1", "rec-hours")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
