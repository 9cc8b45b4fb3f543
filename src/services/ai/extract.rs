use crate::models::BookingFields;
use crate::services::ai::{LlmProvider, Message};

pub const EXTRACTION_PROMPT: &str = r#"You are a field extraction engine for a salon voice receptionist. Analyze the caller's latest utterance.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "service": "the requested salon service, title-cased, or null",
  "date": "requested date like 2024-06-01 or null",
  "time": "requested time in 24-hour form like 14:00 or null",
  "email": "the caller's email address or null"
}

Rules:
- Extract only what the caller actually said; never invent a value.
- Normalize spoken times ("2pm", "half past nine") to HH:MM 24-hour form.
- Normalize spoken dates to YYYY-MM-DD when the caller names a full date.
- Use null for any field not mentioned in this utterance.
"#;

/// Extract a partial booking record from one caller utterance.
///
/// Extraction is best-effort: a malformed model response degrades to "no new
/// fields" so the conversation keeps going. This never returns an error to
/// the orchestrator.
pub async fn extract_fields(llm: &dyn LlmProvider, utterance: &str) -> BookingFields {
    let messages = [Message {
        role: "user".to_string(),
        content: utterance.to_string(),
    }];

    match llm.chat(EXTRACTION_PROMPT, &messages).await {
        Ok(response) => parse_fields_response(&response),
        Err(e) => {
            tracing::warn!(error = %e, "field extraction call failed, continuing without new fields");
            BookingFields::default()
        }
    }
}

fn parse_fields_response(response: &str) -> BookingFields {
    // Try direct parse first
    if let Ok(fields) = serde_json::from_str::<BookingFields>(response) {
        return fields;
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(fields) = serde_json::from_str::<BookingFields>(cleaned) {
        return fields;
    }

    // Try to find a JSON object in the response
    if let Some(start) = cleaned.find('{') {
        if let Some(end) = cleaned.rfind('}') {
            if let Ok(fields) = serde_json::from_str::<BookingFields>(&cleaned[start..=end]) {
                return fields;
            }
        }
    }

    tracing::warn!("failed to parse extraction response as JSON, treating as no new fields");
    BookingFields::default()
}
