//! Per-user track reactions.

use radio_core::reaction::ReactionKind;
use radio_core::types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: RecordId,
    pub user: RecordId,
    pub track: RecordId,
    pub reaction: ReactionKind,
}
