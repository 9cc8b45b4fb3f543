use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Calendar-event request derived from a complete booking record.
/// Start and end are local wall-clock times in `timezone`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRequest {
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timezone: String,
    pub attendee_email: String,
}
