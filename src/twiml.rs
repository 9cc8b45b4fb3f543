//! Minimal TwiML voice-response builder: just the verbs this receptionist
//! emits (Say, Pause, Record, Redirect, Hangup).

use axum::http::header;
use axum::response::{IntoResponse, Response};

const SAY_VOICE: &str = "Polly.Joanna";

#[derive(Debug, Clone)]
enum Verb {
    Say { voice: Option<&'static str>, text: String },
    Pause { length: u32 },
    Record { action: String, max_length: u32, finish_on_key: char },
    Redirect { url: String },
    Hangup,
}

#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            voice: None,
            text: text.into(),
        });
        self
    }

    /// Spoken with the configured synthesis voice rather than the default.
    pub fn say_voiced(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            voice: Some(SAY_VOICE),
            text: text.into(),
        });
        self
    }

    pub fn pause(mut self, length: u32) -> Self {
        self.verbs.push(Verb::Pause { length });
        self
    }

    pub fn record(mut self, action: impl Into<String>, max_length: u32, finish_on_key: char) -> Self {
        self.verbs.push(Verb::Record {
            action: action.into(),
            max_length,
            finish_on_key,
        });
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect { url: url.into() });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            match verb {
                Verb::Say { voice, text } => {
                    match voice {
                        Some(v) => {
                            xml.push_str(&format!(r#"<Say voice="{}">"#, escape_xml(v)))
                        }
                        None => xml.push_str("<Say>"),
                    }
                    xml.push_str(&escape_xml(text));
                    xml.push_str("</Say>");
                }
                Verb::Pause { length } => {
                    xml.push_str(&format!(r#"<Pause length="{length}"/>"#));
                }
                Verb::Record {
                    action,
                    max_length,
                    finish_on_key,
                } => {
                    xml.push_str(&format!(
                        r#"<Record action="{}" maxLength="{}" finishOnKey="{}" transcribe="false"/>"#,
                        escape_xml(action),
                        max_length,
                        finish_on_key,
                    ));
                }
                Verb::Redirect { url } => {
                    xml.push_str(&format!("<Redirect>{}</Redirect>", escape_xml(url)));
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/xml")],
            self.to_xml(),
        )
            .into_response()
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
