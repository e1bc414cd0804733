//! Request handlers.
//!
//! Each submodule provides the async handler functions for one area of the
//! API. Handlers delegate to the repositories in `radio_db` and the engine,
//! and map errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod music;
pub mod pages;
pub mod playlists;
pub mod proxy;
pub mod room;
pub mod user;
