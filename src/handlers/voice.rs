use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Form;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use crate::services::turn;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CallStartForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

#[derive(Deserialize)]
pub struct TurnForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: Option<String>,
}

fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &[(&str, &str)],
) -> bool {
    // Build the data to sign: URL + sorted params concatenated
    let mut data = url.to_string();
    let mut sorted_params = params.to_vec();
    sorted_params.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in &sorted_params {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = match Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(data.as_bytes());
    let result = mac.finalize().into_bytes();
    let expected = base64::engine::general_purpose::STANDARD.encode(result);

    expected == signature
}

/// Reject requests that fail Twilio signature validation. Skipped entirely
/// when no auth token is configured (dev mode).
fn check_signature(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    params: &[(&str, &str)],
) -> Result<(), Response> {
    if state.config.twilio_auth_token.is_empty() {
        return Ok(());
    }

    let signature = headers
        .get("x-twilio-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if signature.is_empty() {
        tracing::warn!("missing X-Twilio-Signature header");
        return Err((axum::http::StatusCode::FORBIDDEN, "Missing signature").into_response());
    }

    // Reconstruct webhook URL — use X-Forwarded-Proto/Host if behind proxy
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let url = format!("{proto}://{host}{path}");

    if !validate_twilio_signature(&state.config.twilio_auth_token, signature, &url, params) {
        tracing::warn!("invalid Twilio signature");
        return Err((axum::http::StatusCode::FORBIDDEN, "Invalid signature").into_response());
    }

    Ok(())
}

/// "Start of call" webhook: play the greeting and record the first turn.
pub async fn call_start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<CallStartForm>,
) -> Response {
    let call_sid = form.call_sid.as_deref().unwrap_or("");
    tracing::info!(call_sid = %call_sid, "incoming call");

    let params = [("CallSid", call_sid)];
    if let Err(rejection) = check_signature(&state, &headers, "/voice", &params) {
        return rejection;
    }

    turn::greeting_response(&state).into_response()
}

/// "Turn complete" webhook: one full trip through the turn orchestrator.
pub async fn process_turn(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<TurnForm>,
) -> Response {
    let recording_url = form.recording_url.as_deref().unwrap_or("");
    tracing::info!(call_sid = %form.call_sid, recording_url = %recording_url, "turn webhook");

    let params = [
        ("CallSid", form.call_sid.as_str()),
        ("RecordingUrl", recording_url),
    ];
    if let Err(rejection) = check_signature(&state, &headers, "/process", &params) {
        return rejection;
    }

    turn::process_turn(&state, &form.call_sid, form.recording_url.as_deref())
        .await
        .into_response()
}
