use std::sync::OnceLock;

use regex::Regex;

use crate::models::{DialogueState, NextAction};
use crate::services::booking::CommitOutcome;

fn exit_lexicon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(goodbye|good bye|bye|hang up|that'?s (all|it|everything)|no thanks?|no thank you|nothing else|i'?m (done|all set|good)|that will be all)\b",
        )
        .expect("exit lexicon regex")
    })
}

fn silence_lexicon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only whitespace and punctuation, i.e. nothing worth transcribing
    RE.get_or_init(|| Regex::new(r"^[\s\p{P}]*$").expect("silence regex"))
}

/// True when the caller's utterance signals they want to end the call.
pub fn is_exit_intent(transcript: &str) -> bool {
    exit_lexicon().is_match(transcript)
}

/// Empty, too short, or only punctuation/whitespace after trimming.
pub fn is_silence(transcript: &str) -> bool {
    let trimmed = transcript.trim();
    trimmed.chars().count() < 2 || silence_lexicon().is_match(trimmed)
}

/// Pick the next dialogue state and outbound action for this turn.
///
/// Exit intent on the caller's own words always wins; a concluded commit
/// attempt (either way) comes next; an incomplete session keeps collecting;
/// otherwise the call just keeps listening. The commit outcome and session
/// shape drive the transition directly, so the system never has to re-parse
/// its own generated prose.
pub fn decide(
    transcript: &str,
    commit: Option<&CommitOutcome>,
    session_incomplete: bool,
) -> (DialogueState, NextAction) {
    if is_exit_intent(transcript) {
        return (DialogueState::Ended, NextAction::EndCall);
    }
    if commit.is_some() {
        return (DialogueState::Confirming, NextAction::ConfirmAndListen);
    }
    if session_incomplete {
        return (DialogueState::Collecting, NextAction::RecordAgain);
    }
    (DialogueState::Listening, NextAction::RecordAgain)
}
