use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    Listening,
    Collecting,
    Confirming,
    Ended,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Listening => "listening",
            DialogueState::Collecting => "collecting",
            DialogueState::Confirming => "confirming",
            DialogueState::Ended => "ended",
        }
    }
}

/// What the rendered voice response should schedule after the spoken reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Prompt the caller to speak again and record another turn.
    RecordAgain,
    /// A booking sub-flow just concluded; confirm, then re-offer a listen.
    ConfirmAndListen,
    /// Caller signaled exit intent; say goodbye and hang up.
    EndCall,
    /// Transcript was silence; send the caller back to the greeting.
    RedirectGreeting,
}
