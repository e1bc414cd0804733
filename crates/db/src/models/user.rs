//! Users of the auth collection.

use radio_core::types::RecordId;
use serde::{Deserialize, Serialize};

use super::fields;

/// Public fields of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "fields::bool_or_false")]
    pub verified: bool,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub avatar: Option<String>,
}
