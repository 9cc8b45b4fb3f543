use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::dialogue::DialogueState;

/// Partial booking record accumulated across caller turns. Each field is
/// present-or-absent; an empty string from the extractor counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingFields {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl BookingFields {
    /// True iff all four fields required for a calendar event are filled.
    pub fn is_complete(&self) -> bool {
        self.service.is_some() && self.date.is_some() && self.time.is_some() && self.email.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.date.is_none() && self.time.is_none() && self.email.is_none()
    }

    /// Names of the fields still missing, in the order we ask for them.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.service.is_none() {
            out.push("service");
        }
        if self.date.is_none() {
            out.push("date");
        }
        if self.time.is_none() {
            out.push("time");
        }
        if self.email.is_none() {
            out.push("email address");
        }
        out
    }
}

/// Per-call conversational state. Lives only while the call is in progress.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub call_sid: String,
    pub fields: BookingFields,
    pub state: DialogueState,
    pub commit_attempts: u32,
    pub last_activity: NaiveDateTime,
}
