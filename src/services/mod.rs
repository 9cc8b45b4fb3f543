pub mod ai;
pub mod booking;
pub mod calendar;
pub mod dialogue;
pub mod recordings;
pub mod reply;
pub mod sessions;
pub mod transcribe;
pub mod turn;
