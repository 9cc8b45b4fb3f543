pub mod booking;
pub mod dialogue;
pub mod session;

pub use booking::EventRequest;
pub use dialogue::{DialogueState, NextAction};
pub use session::{BookingFields, CallSession};
