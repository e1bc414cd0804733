//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&dyn RecordStore` as the first argument.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::{BaasError, Filter, RecordStore};

pub mod generation_repo;
pub mod playlist_repo;
pub mod reaction_repo;
pub mod room_repo;
pub mod track_repo;
pub mod user_repo;

pub use generation_repo::{GenerationCallbackRepo, GenerationRequestRepo};
pub use playlist_repo::{AddEntryOutcome, PlaylistRepo};
pub use reaction_repo::ReactionRepo;
pub use room_repo::RoomRepo;
pub use track_repo::TrackRepo;
pub use user_repo::UserRepo;

/// Ids per `a = x || a = y` filter, keeping query strings short.
const FILTER_BATCH: usize = 50;

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BaasError> {
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn decode_opt<T: DeserializeOwned>(value: Option<Value>) -> Result<Option<T>, BaasError> {
    value.map(decode).transpose()
}

pub(crate) fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>, BaasError> {
    values.into_iter().map(decode).collect()
}

/// Every record whose `field` is one of `ids`, in batches.
pub(crate) async fn list_by_field(
    store: &dyn RecordStore,
    collection: &str,
    field: &str,
    ids: &[String],
    extra: Option<Filter>,
) -> Result<Vec<Value>, BaasError> {
    let mut out = Vec::new();
    for batch in ids.chunks(FILTER_BATCH) {
        let mut filter = Filter::any_of(field, batch);
        if let Some(extra) = &extra {
            filter = Filter::And(vec![filter, extra.clone()]);
        }
        out.extend(store.full_list(collection, Some(filter), None).await?);
    }
    Ok(out)
}
