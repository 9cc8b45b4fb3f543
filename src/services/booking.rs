use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::AppConfig;
use crate::models::{CallSession, EventRequest};
use crate::services::calendar::CalendarProvider;
use crate::services::sessions::SessionStore;

/// How one commit attempt resolved. Carries the user-facing fragment spoken
/// for this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Booked { link: Option<String> },
    Failed,
    GaveUp,
}

impl CommitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitOutcome::Booked { .. } => "booked",
            CommitOutcome::Failed => "failed",
            CommitOutcome::GaveUp => "gave_up",
        }
    }
}

/// Attempt to book a complete session on the calendar. Exactly one calendar
/// call per attempt, no internal retry: the caller speaking again on a later
/// turn is the only retry mechanism. Success deletes the session; failure
/// keeps it so the caller need not repeat anything, until the attempt cap is
/// reached.
pub async fn commit(
    config: &AppConfig,
    calendar: &dyn CalendarProvider,
    sessions: &SessionStore,
    session: &CallSession,
) -> (CommitOutcome, String) {
    debug_assert!(session.fields.is_complete());

    let event = match build_event(config, session) {
        Some(event) => event,
        None => {
            // Date/time text the committer cannot parse counts as a failed
            // attempt; the fields stay put so the caller can restate them.
            tracing::warn!(
                call_sid = %session.call_sid,
                date = ?session.fields.date,
                time = ?session.fields.time,
                "could not parse booking date/time"
            );
            return failed_attempt(
                config,
                sessions,
                session,
                "I'm sorry, I couldn't quite make out the date and time for your appointment. Could you say them again?",
            );
        }
    };

    match calendar.create_event(&event).await {
        Ok(link) => {
            sessions.delete(&session.call_sid);
            let fragment = format!(
                "Your {} is booked for {} at {}. A calendar invitation is on its way to {}.",
                event.summary,
                event.start.format("%A, %B %-d"),
                event.start.format("%-I:%M %p"),
                event.attendee_email,
            );
            tracing::info!(call_sid = %session.call_sid, link = ?link, "booking created");
            (CommitOutcome::Booked { link }, fragment)
        }
        Err(e) => {
            tracing::error!(call_sid = %session.call_sid, error = %e, "calendar booking failed");
            failed_attempt(
                config,
                sessions,
                session,
                "I'm sorry, I wasn't able to book that just now. I've kept your details, so we can try again in a moment.",
            )
        }
    }
}

fn failed_attempt(
    config: &AppConfig,
    sessions: &SessionStore,
    session: &CallSession,
    apology: &str,
) -> (CommitOutcome, String) {
    let attempts = sessions.record_commit_failure(&session.call_sid);
    if attempts >= config.max_commit_attempts {
        // Cap reached: stop retrying across turns and release the session.
        sessions.delete(&session.call_sid);
        tracing::warn!(call_sid = %session.call_sid, attempts, "giving up on booking after repeated failures");
        (
            CommitOutcome::GaveUp,
            "I'm sorry, I wasn't able to complete your booking today. Please call back later or book with us in person.".to_string(),
        )
    } else {
        (CommitOutcome::Failed, apology.to_string())
    }
}

/// Turn a complete record into a calendar-event request: start = date+time in
/// the configured zone, end = start + configured duration, title/description
/// templated from the service.
pub fn build_event(config: &AppConfig, session: &CallSession) -> Option<EventRequest> {
    let fields = &session.fields;
    let service = fields.service.as_deref()?;
    let email = fields.email.as_deref()?;

    let date = NaiveDate::parse_from_str(fields.date.as_deref()?, "%Y-%m-%d").ok()?;
    let time_str = fields.time.as_deref()?;
    let time = NaiveTime::parse_from_str(time_str, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M:%S"))
        .ok()?;

    let start = NaiveDateTime::new(date, time);
    Some(EventRequest {
        summary: service.to_string(),
        description: format!("{service} appointment booked by the Nova Salon phone receptionist."),
        start,
        end: start + Duration::minutes(config.booking_duration_minutes),
        timezone: config.timezone.clone(),
        attendee_email: email.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingFields, DialogueState};

    fn test_config() -> AppConfig {
        AppConfig {
            port: 5000,
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            openai_api_key: String::new(),
            chat_model: "gpt-4".to_string(),
            transcribe_model: "whisper-1".to_string(),
            calendar_id: "primary".to_string(),
            calendar_token: String::new(),
            timezone: "America/New_York".to_string(),
            booking_duration_minutes: 30,
            max_commit_attempts: 3,
            session_idle_minutes: 15,
            record_max_seconds: 20,
        }
    }

    fn complete_session() -> CallSession {
        CallSession {
            call_sid: "CA1".to_string(),
            fields: BookingFields {
                service: Some("Gel Manicure".to_string()),
                date: Some("2024-06-01".to_string()),
                time: Some("14:00".to_string()),
                email: Some("a@b.com".to_string()),
            },
            state: DialogueState::Collecting,
            commit_attempts: 0,
            last_activity: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_build_event_start_plus_duration() {
        let event = build_event(&test_config(), &complete_session()).unwrap();
        assert_eq!(event.summary, "Gel Manicure");
        assert_eq!(event.start.format("%Y-%m-%d %H:%M").to_string(), "2024-06-01 14:00");
        assert_eq!(event.end - event.start, Duration::minutes(30));
        assert_eq!(event.timezone, "America/New_York");
        assert_eq!(event.attendee_email, "a@b.com");
    }

    #[test]
    fn test_build_event_accepts_seconds_in_time() {
        let mut session = complete_session();
        session.fields.time = Some("09:30:00".to_string());
        let event = build_event(&test_config(), &session).unwrap();
        assert_eq!(event.start.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn test_build_event_rejects_unparseable_date() {
        let mut session = complete_session();
        session.fields.date = Some("next Tuesday".to_string());
        assert!(build_event(&test_config(), &session).is_none());
    }
}
