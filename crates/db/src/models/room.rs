//! The shared listening room.

use radio_core::room::RoomState;
use radio_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields;

/// A room record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RecordId,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub current_track: Option<RecordId>,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub next_track: Option<RecordId>,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub current_start: Option<Timestamp>,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub prompt: String,
    #[serde(default, deserialize_with = "fields::active_request")]
    pub active_request: Option<RecordId>,
    #[serde(default, deserialize_with = "fields::bool_or_false")]
    pub disable_generate: bool,
    #[serde(default, deserialize_with = "fields::bool_or_false")]
    pub instrumental: bool,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub created: Option<Timestamp>,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub updated: Option<Timestamp>,
}

impl Room {
    /// The fields that drive advancement.
    pub fn state(&self) -> RoomState {
        RoomState {
            current_track: self.current_track.clone(),
            next_track: self.next_track.clone(),
            active_request: self.active_request.clone(),
            disable_generate: self.disable_generate,
        }
    }
}

/// A partial room update. `Some(None)` clears a relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomUpdate {
    pub current_track: Option<Option<RecordId>>,
    pub next_track: Option<Option<RecordId>>,
    pub current_start: Option<Timestamp>,
    pub active_request: Option<Option<RecordId>>,
}

impl RoomUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The PATCH body for this update.
    pub fn to_patch(&self) -> Value {
        fn relation(value: &Option<RecordId>) -> Value {
            value.clone().map(Value::String).unwrap_or(Value::Null)
        }

        let mut patch = Map::new();
        if let Some(track) = &self.current_track {
            patch.insert("current_track".into(), relation(track));
        }
        if let Some(track) = &self.next_track {
            patch.insert("next_track".into(), relation(track));
        }
        if let Some(start) = &self.current_start {
            patch.insert(
                "current_start".into(),
                Value::String(fields::format_timestamp(start)),
            );
        }
        if let Some(request) = &self.active_request {
            patch.insert("active_request".into(), relation(request));
        }
        Value::Object(patch)
    }

    /// Apply this update to an in-memory copy of the room.
    pub fn apply_to(&self, room: &mut Room) {
        if let Some(track) = &self.current_track {
            room.current_track = track.clone();
        }
        if let Some(track) = &self.next_track {
            room.next_track = track.clone();
        }
        if let Some(start) = self.current_start {
            room.current_start = Some(start);
        }
        if let Some(request) = &self.active_request {
            room.active_request = request.clone();
        }
    }
}
