//! Record models.
//!
//! Each submodule contains:
//! - A `Deserialize` + `Serialize` entity struct matching the BaaS record
//! - `Serialize` DTOs for creates and patches where the repositories need them

pub mod fields;
pub mod generation;
pub mod playlist;
pub mod reaction;
pub mod room;
pub mod track;
pub mod user;
