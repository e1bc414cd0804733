//! Repository for the `radio_user_track_reaction` collection.

use radio_core::reaction::{decide_toggle, ReactionKind, ToggleAction};
use radio_core::types::RecordId;
use serde_json::json;

use crate::collections::REACTIONS;
use crate::models::reaction::Reaction;
use crate::store::{BaasError, Filter, RecordStore};

use super::{decode_all, decode_opt, list_by_field};

fn owned_by(user: &str) -> Filter {
    Filter::eq("user", user)
}

pub struct ReactionRepo;

impl ReactionRepo {
    pub async fn find(
        store: &dyn RecordStore,
        user: &str,
        track: &str,
    ) -> Result<Option<Reaction>, BaasError> {
        let filter = Filter::And(vec![owned_by(user), Filter::eq("track", track)]);
        decode_opt(store.first(REACTIONS, filter, None).await?)
    }

    /// Apply a like/dislike toggle and report what happened.
    ///
    /// No reaction creates one; the same reaction removes it; the opposite
    /// one replaces it.
    pub async fn toggle(
        store: &dyn RecordStore,
        user: &str,
        track: &str,
        requested: ReactionKind,
    ) -> Result<ToggleAction, BaasError> {
        let existing = Self::find(store, user, track).await?;
        let action = decide_toggle(existing.as_ref().map(|r| r.reaction), requested);

        match (&action, existing) {
            (ToggleAction::Create(kind), _) => {
                let body = json!({ "user": user, "track": track, "reaction": kind });
                store.create(REACTIONS, &body).await?;
            }
            (ToggleAction::Remove, Some(existing)) => {
                store.delete(REACTIONS, &existing.id).await?;
            }
            (ToggleAction::Replace(kind), Some(existing)) => {
                store
                    .update(REACTIONS, &existing.id, &json!({ "reaction": kind }))
                    .await?;
            }
            // decide_toggle only removes or replaces an existing reaction.
            (_, None) => {}
        }
        Ok(action)
    }

    /// The user's reactions to any of `tracks`.
    pub async fn for_tracks(
        store: &dyn RecordStore,
        user: &str,
        tracks: &[RecordId],
    ) -> Result<Vec<Reaction>, BaasError> {
        decode_all(list_by_field(store, REACTIONS, "track", tracks, Some(owned_by(user))).await?)
    }

    /// Every reaction of the user.
    pub async fn all_for_user(store: &dyn RecordStore, user: &str) -> Result<Vec<Reaction>, BaasError> {
        decode_all(store.full_list(REACTIONS, Some(owned_by(user)), Some("-created")).await?)
    }

    /// Ids of the tracks the user liked, most recent first.
    pub async fn liked_track_ids(
        store: &dyn RecordStore,
        user: &str,
    ) -> Result<Vec<RecordId>, BaasError> {
        let filter = Filter::And(vec![
            owned_by(user),
            Filter::eq("reaction", ReactionKind::Like.as_str()),
        ]);
        let liked: Vec<Reaction> =
            decode_all(store.full_list(REACTIONS, Some(filter), Some("-created")).await?)?;
        Ok(liked.into_iter().map(|r| r.track).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn toggle_cycles_through_states() {
        let store = MemoryStore::new();

        let action = ReactionRepo::toggle(&store, "u1", "t1", ReactionKind::Like).await.unwrap();
        assert_eq!(action.status(), "created");

        let action = ReactionRepo::toggle(&store, "u1", "t1", ReactionKind::Dislike).await.unwrap();
        assert_eq!(action.status(), "updated");
        let stored = ReactionRepo::find(&store, "u1", "t1").await.unwrap().unwrap();
        assert_eq!(stored.reaction, ReactionKind::Dislike);

        let action = ReactionRepo::toggle(&store, "u1", "t1", ReactionKind::Dislike).await.unwrap();
        assert_eq!(action.status(), "removed");
        assert!(store.dump(REACTIONS).await.is_empty());
    }

    #[tokio::test]
    async fn reactions_are_per_user() {
        let store = MemoryStore::new();
        ReactionRepo::toggle(&store, "u1", "t1", ReactionKind::Like).await.unwrap();
        ReactionRepo::toggle(&store, "u2", "t1", ReactionKind::Like).await.unwrap();
        ReactionRepo::toggle(&store, "u1", "t2", ReactionKind::Dislike).await.unwrap();

        assert_eq!(ReactionRepo::liked_track_ids(&store, "u1").await.unwrap(), ["t1"]);
        let on_t1 = ReactionRepo::for_tracks(&store, "u1", &["t1".to_string()]).await.unwrap();
        assert_eq!(on_t1.len(), 1);
        assert_eq!(ReactionRepo::all_for_user(&store, "u1").await.unwrap().len(), 2);
    }
}
