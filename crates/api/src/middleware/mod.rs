//! Session extractors and cookie helpers.
//!
//! - [`auth::SessionUser`] -- Requires a valid session (401 otherwise).
//! - [`auth::SubmitterSession`] -- Requires a valid session for generation
//!   (401 without a cookie, 403 for a rejected session).
//! - [`auth::OptionalSession`] -- Resolves a session when one is present.

pub mod auth;
