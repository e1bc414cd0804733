//! Repositories for `radio_generate_requests` and `radio_generate_callbacks`.

use crate::collections::{GENERATION_CALLBACKS, GENERATION_REQUESTS};
use crate::models::generation::{
    CreateGenerationRequest, GenerationCallback, GenerationRequest, UpdateGenerationRequest,
    UpsertGenerationCallback,
};
use crate::store::{BaasError, Filter, RecordStore};

use super::{decode, decode_opt};

/// Provides access to generation request records.
pub struct GenerationRequestRepo;

impl GenerationRequestRepo {
    /// Persist a new request, returning the stored record.
    pub async fn create(
        store: &dyn RecordStore,
        input: &CreateGenerationRequest,
    ) -> Result<GenerationRequest, BaasError> {
        let body = serde_json::to_value(input)?;
        decode(store.create(GENERATION_REQUESTS, &body).await?)
    }

    pub async fn find(
        store: &dyn RecordStore,
        id: &str,
    ) -> Result<Option<GenerationRequest>, BaasError> {
        decode_opt(store.get(GENERATION_REQUESTS, id).await?)
    }

    /// Find the request the generation API assigned `task_id` to.
    pub async fn find_by_task_id(
        store: &dyn RecordStore,
        task_id: &str,
    ) -> Result<Option<GenerationRequest>, BaasError> {
        decode_opt(
            store
                .first(GENERATION_REQUESTS, Filter::eq("taskId", task_id), None)
                .await?,
        )
    }

    /// Find the latest submission by the same user with the same key.
    pub async fn find_by_idempotency_key(
        store: &dyn RecordStore,
        user: Option<&str>,
        key: &str,
    ) -> Result<Option<GenerationRequest>, BaasError> {
        let filter = Filter::And(vec![
            Filter::eq("idempotency_key", key),
            Filter::eq("user", user.unwrap_or_default()),
        ]);
        decode_opt(store.first(GENERATION_REQUESTS, filter, Some("-created")).await?)
    }

    /// Record the outcome of the upstream call.
    pub async fn record_outcome(
        store: &dyn RecordStore,
        id: &str,
        outcome: &UpdateGenerationRequest,
    ) -> Result<GenerationRequest, BaasError> {
        let body = serde_json::to_value(outcome)?;
        decode(store.update(GENERATION_REQUESTS, id, &body).await?)
    }
}

/// Provides access to the webhook audit log.
pub struct GenerationCallbackRepo;

impl GenerationCallbackRepo {
    /// Create or replace the audit record for a task.
    pub async fn upsert(
        store: &dyn RecordStore,
        input: &UpsertGenerationCallback,
    ) -> Result<GenerationCallback, BaasError> {
        let body = serde_json::to_value(input)?;
        let existing = store
            .first(GENERATION_CALLBACKS, Filter::eq("task_id", input.task_id.as_str()), None)
            .await?;
        let record = match existing.as_ref().and_then(|r| r["id"].as_str()) {
            Some(id) => store.update(GENERATION_CALLBACKS, id, &body).await?,
            None => store.create(GENERATION_CALLBACKS, &body).await?,
        };
        decode(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::generation::RequestStatus;
    use radio_core::generation::GenerationParams;
    use serde_json::json;

    fn create_input(key: Option<&str>) -> CreateGenerationRequest {
        CreateGenerationRequest {
            params: GenerationParams::for_room("lofi beats to study to", false),
            callback_url: "https://radio.example.com/api/music/callback".into(),
            user: Some("usr000000000001".into()),
            status: RequestStatus::Pending,
            idempotency_key: key.map(String::from),
        }
    }

    #[tokio::test]
    async fn create_then_record_outcome() {
        let store = MemoryStore::new();
        let created = GenerationRequestRepo::create(&store, &create_input(None)).await.unwrap();
        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.prompt, "lofi beats to study to");

        let updated = GenerationRequestRepo::record_outcome(
            &store,
            &created.id,
            &UpdateGenerationRequest {
                status: RequestStatus::Submitted,
                task_id: Some("task-1".into()),
                error: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, RequestStatus::Submitted);

        let by_task = GenerationRequestRepo::find_by_task_id(&store, "task-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_task.id, created.id);
    }

    #[tokio::test]
    async fn idempotency_key_is_scoped_to_user() {
        let store = MemoryStore::new();
        GenerationRequestRepo::create(&store, &create_input(Some("k1"))).await.unwrap();

        let same_user =
            GenerationRequestRepo::find_by_idempotency_key(&store, Some("usr000000000001"), "k1")
                .await
                .unwrap();
        assert!(same_user.is_some());

        let other_user =
            GenerationRequestRepo::find_by_idempotency_key(&store, Some("usr000000000002"), "k1")
                .await
                .unwrap();
        assert!(other_user.is_none());
    }

    #[tokio::test]
    async fn idempotency_lookup_returns_latest_attempt() {
        let store = MemoryStore::new();
        GenerationRequestRepo::create(&store, &create_input(Some("k1"))).await.unwrap();
        let retry = GenerationRequestRepo::create(&store, &create_input(Some("k1"))).await.unwrap();

        let found =
            GenerationRequestRepo::find_by_idempotency_key(&store, Some("usr000000000001"), "k1")
                .await
                .unwrap()
                .unwrap();
        assert_eq!(found.id, retry.id);
    }

    #[tokio::test]
    async fn callback_upsert_keeps_one_record_per_task() {
        let store = MemoryStore::new();
        for stage in ["text", "first", "complete"] {
            GenerationCallbackRepo::upsert(
                &store,
                &UpsertGenerationCallback {
                    task_id: "task-1".into(),
                    code: 200,
                    msg: "success".into(),
                    callback_type: stage.into(),
                    data: json!([]),
                },
            )
            .await
            .unwrap();
        }
        let records = store.dump(GENERATION_CALLBACKS).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["callbackType"], "complete");
    }
}
