use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{DialogueState, NextAction};
use crate::services::ai::extract::extract_fields;
use crate::services::{booking, dialogue, reply};
use crate::state::AppState;
use crate::twiml::VoiceResponse;

pub const GREETING: &str =
    "Hi! Welcome to Nova Salon. Please ask your question after the beep, then press the pound key.";
pub const REPROMPT: &str =
    "I didn't catch that. Could you please repeat your question after the beep?";
pub const FOLLOW_UP: &str =
    "Would you like to ask another question? If yes, speak after the beep and press pound.";
pub const APOLOGY: &str = "Sorry, something went wrong. Please try again later.";
pub const CLOSING: &str = "Thank you for calling Nova Salon. Goodbye!";
pub const FINISH_KEY: char = '#';

/// One caller turn, end to end. Never fails the webhook: anything unexpected
/// is answered with a single generic apology and the call is left alive for
/// the next turn.
pub async fn process_turn(
    state: &Arc<AppState>,
    call_sid: &str,
    recording_url: Option<&str>,
) -> VoiceResponse {
    match run_turn(state, call_sid, recording_url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(call_sid = %call_sid, error = %e, "turn failed");
            VoiceResponse::new().say(APOLOGY)
        }
    }
}

async fn run_turn(
    state: &Arc<AppState>,
    call_sid: &str,
    recording_url: Option<&str>,
) -> Result<VoiceResponse, AppError> {
    let recording_url = recording_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(AppError::MissingRecording)?;

    let audio = state
        .recordings
        .fetch(recording_url)
        .await
        .map_err(|e| AppError::RecordingFetch(e.to_string()))?;

    let transcript = state
        .transcriber
        .transcribe(audio)
        .await
        .map_err(|e| AppError::Transcription(e.to_string()))?;

    // Silence never reaches the language model; just steer the caller back
    // to the greeting.
    if dialogue::is_silence(&transcript) {
        tracing::info!(call_sid = %call_sid, "silent or garbled turn, reprompting");
        return Ok(render_directive(state, REPROMPT, NextAction::RedirectGreeting));
    }

    tracing::info!(call_sid = %call_sid, transcript = %transcript, "caller turn");

    // Exit intent overrides everything else, including an in-flight booking.
    if dialogue::is_exit_intent(&transcript) {
        state.sessions.delete(call_sid);
        return Ok(render_directive(state, CLOSING, NextAction::EndCall));
    }

    let extracted = extract_fields(state.llm.as_ref(), &transcript).await;

    // Touch the session only once the caller has started a booking; a pure
    // information call never allocates one.
    let session = if !extracted.is_empty() || state.sessions.get(call_sid).is_some() {
        Some(state.sessions.merge(call_sid, &extracted))
    } else {
        None
    };

    let commit = match &session {
        Some(session) if session.fields.is_complete() => Some(
            booking::commit(
                &state.config,
                state.calendar.as_ref(),
                &state.sessions,
                session,
            )
            .await,
        ),
        _ => None,
    };

    // A concluded commit attempt speaks its own fragment; every other turn
    // gets a conversational reply grounded in the salon persona and whatever
    // the session still needs.
    let spoken = match &commit {
        Some((outcome, fragment)) => {
            tracing::info!(call_sid = %call_sid, outcome = outcome.as_str(), "booking commit attempt");
            fragment.clone()
        }
        None => {
            let fields = session.as_ref().map(|s| s.fields.clone()).unwrap_or_default();
            reply::generate_reply(state.llm.as_ref(), &fields, &transcript)
                .await
                .map_err(|e| AppError::Ai(e.to_string()))?
        }
    };

    let still_incomplete = state
        .sessions
        .get(call_sid)
        .map(|s| !s.fields.is_complete())
        .unwrap_or(false);

    let (next_state, action) = dialogue::decide(
        &transcript,
        commit.as_ref().map(|(outcome, _)| outcome),
        still_incomplete,
    );
    state.sessions.set_state(call_sid, next_state);
    if next_state == DialogueState::Ended {
        state.sessions.delete(call_sid);
    }

    tracing::info!(
        call_sid = %call_sid,
        state = next_state.as_str(),
        "turn complete"
    );

    Ok(render_directive(state, &spoken, action))
}

/// Render the outbound voice directive for a spoken reply and next action.
pub fn render_directive(state: &AppState, spoken: &str, action: NextAction) -> VoiceResponse {
    let max_len = state.config.record_max_seconds;
    match action {
        NextAction::EndCall => VoiceResponse::new().say_voiced(spoken).hangup(),
        NextAction::RedirectGreeting => VoiceResponse::new().say(spoken).redirect("/voice"),
        NextAction::RecordAgain | NextAction::ConfirmAndListen => VoiceResponse::new()
            .say_voiced(spoken)
            .pause(1)
            .say(FOLLOW_UP)
            .record("/process", max_len, FINISH_KEY),
    }
}

/// The greeting played at call start, ending in a record directive.
pub fn greeting_response(state: &AppState) -> VoiceResponse {
    VoiceResponse::new()
        .say(GREETING)
        .record("/process", state.config.record_max_seconds, FINISH_KEY)
}
