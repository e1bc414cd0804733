//! Room advancement planning.
//!
//! The room is the shared "now playing" record. Advancing it is a small
//! state machine: promote the queued track, then make sure something will
//! be queued next time, either by asking for a new generation or by picking
//! a catalog track at random. This module decides *what* to do; the API
//! crate performs the I/O.

use crate::types::{RecordId, Timestamp};

/// The fields of a room that drive advancement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomState {
    pub current_track: Option<RecordId>,
    pub next_track: Option<RecordId>,
    pub active_request: Option<RecordId>,
    pub disable_generate: bool,
}

/// How the queue slot should be refilled after promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refill {
    /// A track is already queued or a generation is already in flight.
    Nothing,
    /// Submit a generation job; fall back to [`Refill::PickRandom`] on failure.
    Generate,
    /// Pick a uniformly random catalog track.
    PickRandom,
}

/// A promotion of the queued track to the current slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub track: RecordId,
    pub started_at: Timestamp,
}

/// Outcome of [`plan_advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancePlan {
    pub promotion: Option<Promotion>,
    pub refill: Refill,
}

impl AdvancePlan {
    /// `true` when the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.promotion.is_none() && self.refill == Refill::Nothing
    }
}

/// Plan one advance tick.
///
/// 1. A queued `next_track` becomes `current_track` starting at `now`.
/// 2. With the queue then empty and no generation in flight, refill it:
///    generate unless generation is disabled for the room.
pub fn plan_advance(state: &RoomState, now: Timestamp) -> AdvancePlan {
    let promotion = state.next_track.as_ref().map(|track| Promotion {
        track: track.clone(),
        started_at: now,
    });

    // After a promotion the queue slot is always empty.
    let queue_empty = promotion.is_some() || state.next_track.is_none();

    let refill = if !queue_empty || state.active_request.is_some() {
        Refill::Nothing
    } else if state.disable_generate {
        Refill::PickRandom
    } else {
        Refill::Generate
    };

    AdvancePlan { promotion, refill }
}

/// Whether a finished generation should land in the room's queue.
///
/// Only the request the room is waiting on may fill the slot, and only when
/// the slot is still empty.
pub fn should_queue_generated(state: &RoomState, request_id: &str) -> bool {
    state.active_request.as_deref() == Some(request_id) && state.next_track.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn state(next: Option<&str>, active: Option<&str>, disable_generate: bool) -> RoomState {
        RoomState {
            current_track: Some("cur".into()),
            next_track: next.map(String::from),
            active_request: active.map(String::from),
            disable_generate,
        }
    }

    #[test]
    fn promotes_next_track_and_generates() {
        let plan = plan_advance(&state(Some("nxt"), None, false), now());
        assert_eq!(
            plan.promotion,
            Some(Promotion {
                track: "nxt".into(),
                started_at: now()
            })
        );
        assert_eq!(plan.refill, Refill::Generate);
    }

    #[test]
    fn promotes_without_refill_while_generation_in_flight() {
        let plan = plan_advance(&state(Some("nxt"), Some("req"), false), now());
        assert!(plan.promotion.is_some());
        assert_eq!(plan.refill, Refill::Nothing);
    }

    #[test]
    fn picks_random_when_generation_disabled() {
        let plan = plan_advance(&state(None, None, true), now());
        assert!(plan.promotion.is_none());
        assert_eq!(plan.refill, Refill::PickRandom);
    }

    #[test]
    fn does_nothing_when_waiting_on_generation() {
        let plan = plan_advance(&state(None, Some("req"), true), now());
        assert!(plan.is_noop());
    }

    #[test]
    fn queue_fill_requires_matching_request() {
        let waiting = state(None, Some("req1"), false);
        assert!(should_queue_generated(&waiting, "req1"));
        assert!(!should_queue_generated(&waiting, "req2"));

        let already_queued = state(Some("nxt"), Some("req1"), false);
        assert!(!should_queue_generated(&already_queued, "req1"));
    }
}
