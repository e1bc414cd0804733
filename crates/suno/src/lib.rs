//! Clients for the external generation services.
//!
//! - [`api`] -- music generation API (job submission)
//! - [`messages`] -- webhook payloads the generation API posts back
//! - [`gateway`] -- AI text gateway used to enhance prompts
//! - [`media`] -- download of generated audio and cover images

pub mod api;
pub mod gateway;
pub mod media;
pub mod messages;
