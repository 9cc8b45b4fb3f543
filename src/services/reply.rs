use crate::models::BookingFields;
use crate::services::ai::{LlmProvider, Message};

pub const SALON_PERSONA: &str = r#"You are the phone receptionist for Nova Salon. Answer in one or two short spoken sentences; your reply is read aloud over the phone, so no lists, no markdown, no emoji.

Location: 123 Beauty St, New York, NY

Hours of operation:
- Monday-Wednesday: 10:00 AM - 6:00 PM
- Thursday-Friday: 10:00 AM - 8:00 PM
- Saturday: 9:00 AM - 6:00 PM
- Sunday: 11:00 AM - 4:00 PM

Services and prices:
- Gel Manicure: $40
- Acrylic Full Set: $55
- Basic Pedicure: $35
- Brow Wax: $15
- Lash Extensions (Classic): $80
- Silk Press: $70
- Box Braids (Medium): $150 and up
- Kids Braids (Under 10): $85

Policies:
- Cancel or reschedule at least 24 hours in advance.
- Late arrivals over 15 minutes may need to reschedule.
- Walk-ins welcome when available.
- No-shows may be charged a cancellation fee.

Holiday closures: New Year's Day, Easter Sunday, July 4th, Thanksgiving, Christmas."#;

/// Generate the spoken reply for a turn that did not conclude a booking:
/// either a general salon-information answer or a booking-flow answer that
/// asks for whatever is still missing.
pub async fn generate_reply(
    llm: &dyn LlmProvider,
    fields: &BookingFields,
    utterance: &str,
) -> anyhow::Result<String> {
    let system = if fields.is_empty() {
        SALON_PERSONA.to_string()
    } else {
        format!(
            "{SALON_PERSONA}\n\nThe caller is booking an appointment. Collected so far: {}. Still needed: {}. Acknowledge what they said and ask for one missing item.",
            describe_fields(fields),
            if fields.missing().is_empty() {
                "nothing".to_string()
            } else {
                fields.missing().join(", ")
            },
        )
    };

    let messages = [Message {
        role: "user".to_string(),
        content: utterance.to_string(),
    }];

    let raw = llm.chat(&system, &messages).await?;
    Ok(sanitize_reply(&raw))
}

fn describe_fields(fields: &BookingFields) -> String {
    let mut parts = Vec::new();
    if let Some(service) = &fields.service {
        parts.push(format!("service {service}"));
    }
    if let Some(date) = &fields.date {
        parts.push(format!("date {date}"));
    }
    if let Some(time) = &fields.time {
        parts.push(format!("time {time}"));
    }
    if let Some(email) = &fields.email {
        parts.push(format!("email {email}"));
    }
    if parts.is_empty() {
        "nothing yet".to_string()
    } else {
        parts.join(", ")
    }
}

/// Model output goes straight to speech synthesis: drop emoji and pictograph
/// glyphs, collapse line breaks into spaces, trim.
pub fn sanitize_reply(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\u{1F300}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}' | '\u{FE0F}' => {}
            '\n' | '\r' => out.push(' '),
            _ => out.push(ch),
        }
    }
    let collapsed: Vec<&str> = out.split_whitespace().collect();
    collapsed.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_emoji() {
        assert_eq!(
            sanitize_reply("See you soon! \u{1F485}\u{2728}"),
            "See you soon!"
        );
    }

    #[test]
    fn test_sanitize_collapses_line_breaks() {
        assert_eq!(
            sanitize_reply("We open at ten.\nClosed on Christmas.\r\n"),
            "We open at ten. Closed on Christmas."
        );
    }

    #[test]
    fn test_sanitize_plain_text_unchanged() {
        assert_eq!(sanitize_reply("A gel manicure is $40."), "A gel manicure is $40.");
    }

    #[test]
    fn test_describe_fields_lists_collected_values() {
        let fields = BookingFields {
            service: Some("Silk Press".to_string()),
            date: None,
            time: Some("14:00".to_string()),
            email: None,
        };
        assert_eq!(describe_fields(&fields), "service Silk Press, time 14:00");
    }

    #[test]
    fn test_describe_fields_empty() {
        assert_eq!(describe_fields(&BookingFields::default()), "nothing yet");
    }
}
