//! Like/dislike reactions.
//!
//! A user has at most one reaction per track. Sending the reaction already
//! recorded removes it; sending the opposite one replaces it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(ReactionKind::Like),
            "dislike" => Some(ReactionKind::Dislike),
            _ => None,
        }
    }
}

/// What a toggle request does to the stored reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Create(ReactionKind),
    Remove,
    Replace(ReactionKind),
}

impl ToggleAction {
    /// Status string reported to clients.
    pub fn status(self) -> &'static str {
        match self {
            ToggleAction::Create(_) => "created",
            ToggleAction::Remove => "removed",
            ToggleAction::Replace(_) => "updated",
        }
    }

    /// The reaction stored after the action, if any.
    pub fn resulting(self) -> Option<ReactionKind> {
        match self {
            ToggleAction::Create(kind) | ToggleAction::Replace(kind) => Some(kind),
            ToggleAction::Remove => None,
        }
    }
}

pub fn decide_toggle(existing: Option<ReactionKind>, requested: ReactionKind) -> ToggleAction {
    match existing {
        None => ToggleAction::Create(requested),
        Some(current) if current == requested => ToggleAction::Remove,
        Some(_) => ToggleAction::Replace(requested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_reaction_twice_returns_to_none() {
        let first = decide_toggle(None, ReactionKind::Like);
        assert_eq!(first, ToggleAction::Create(ReactionKind::Like));
        let second = decide_toggle(first.resulting(), ReactionKind::Like);
        assert_eq!(second, ToggleAction::Remove);
        assert_eq!(second.resulting(), None);
    }

    #[test]
    fn opposite_reaction_replaces() {
        let action = decide_toggle(Some(ReactionKind::Dislike), ReactionKind::Like);
        assert_eq!(action, ToggleAction::Replace(ReactionKind::Like));
        assert_eq!(action.status(), "updated");
    }

    #[test]
    fn parses_wire_values() {
        assert_eq!(ReactionKind::parse("dislike"), Some(ReactionKind::Dislike));
        assert_eq!(ReactionKind::parse("love"), None);
    }
}
