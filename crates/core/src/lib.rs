//! Domain rules for the radio backend.
//!
//! Everything in this crate is pure: request validation, the room
//! advancement plan, reaction toggling and session cookie helpers. I/O lives
//! in `radio-db` (BaaS) and `radio-suno` (generation API).

pub mod error;
pub mod generation;
pub mod reaction;
pub mod room;
pub mod search;
pub mod session;
pub mod types;
