use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime, Utc};

use crate::models::{BookingFields, CallSession, DialogueState};

/// In-memory store of per-call sessions, keyed by call SID.
///
/// A single global mutex guards the map; every operation takes the lock once
/// and applies all of its writes together, so overlapping turns for the same
/// call degrade to last-writer-wins per field rather than torn updates.
/// Sessions idle longer than `idle_timeout` are swept by `evict_idle`.
pub struct SessionStore {
    inner: Mutex<HashMap<String, CallSession>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_minutes: i64) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            idle_timeout: Duration::minutes(idle_minutes),
        }
    }

    pub fn get(&self, call_sid: &str) -> Option<CallSession> {
        self.inner.lock().unwrap().get(call_sid).cloned()
    }

    pub fn get_or_create(&self, call_sid: &str) -> CallSession {
        let mut map = self.inner.lock().unwrap();
        map.entry(call_sid.to_string())
            .or_insert_with(|| empty_session(call_sid, Utc::now().naive_utc()))
            .clone()
    }

    /// Merge a partial record into the session, creating it if absent.
    /// Only non-empty fields of `fields` overwrite; everything else is left
    /// untouched. Returns the updated snapshot.
    pub fn merge(&self, call_sid: &str, fields: &BookingFields) -> CallSession {
        let now = Utc::now().naive_utc();
        let mut map = self.inner.lock().unwrap();
        let session = map
            .entry(call_sid.to_string())
            .or_insert_with(|| empty_session(call_sid, now));

        if let Some(service) = &fields.service {
            session.fields.service = Some(service.clone());
        }
        if let Some(date) = &fields.date {
            session.fields.date = Some(date.clone());
        }
        if let Some(time) = &fields.time {
            session.fields.time = Some(time.clone());
        }
        if let Some(email) = &fields.email {
            session.fields.email = Some(email.clone());
        }
        session.last_activity = now;
        session.clone()
    }

    pub fn set_state(&self, call_sid: &str, state: DialogueState) {
        if let Some(session) = self.inner.lock().unwrap().get_mut(call_sid) {
            session.state = state;
        }
    }

    /// Bump the failure counter after an unsuccessful commit. Returns the new
    /// attempt count, or 0 if the session vanished in the meantime.
    pub fn record_commit_failure(&self, call_sid: &str) -> u32 {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(call_sid) {
            Some(session) => {
                session.commit_attempts += 1;
                session.commit_attempts
            }
            None => 0,
        }
    }

    /// Idempotent: deleting an absent session is a no-op.
    pub fn delete(&self, call_sid: &str) {
        self.inner.lock().unwrap().remove(call_sid);
    }

    /// Drop sessions whose last activity is older than the idle timeout.
    /// Returns the number of sessions evicted.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Utc::now().naive_utc())
    }

    fn evict_idle_at(&self, now: NaiveDateTime) -> usize {
        let cutoff = now - self.idle_timeout;
        let mut map = self.inner.lock().unwrap();
        let before = map.len();
        map.retain(|_, session| session.last_activity >= cutoff);
        before - map.len()
    }
}

fn empty_session(call_sid: &str, now: NaiveDateTime) -> CallSession {
    CallSession {
        call_sid: call_sid.to_string(),
        fields: BookingFields::default(),
        state: DialogueState::Listening,
        commit_attempts: 0,
        last_activity: now,
    }
}
