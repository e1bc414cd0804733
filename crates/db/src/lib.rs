//! Persistence for the radio backend.
//!
//! All records live in a hosted BaaS. [`RecordStore`] is the seam: the
//! production implementation is [`pocketbase::PocketBase`] (REST over
//! `reqwest`), and [`memory::MemoryStore`] backs tests and offline runs.
//! Repositories are zero-sized structs whose methods take
//! `&dyn RecordStore` as their first argument.

pub mod collections;
pub mod memory;
pub mod models;
pub mod pocketbase;
pub mod repositories;
pub mod session;
pub mod store;

pub use store::{BaasError, FileUpload, Filter, ListPage, ListQuery, RecordStore};

/// Check that the BaaS answers its health endpoint.
pub async fn health_check(store: &dyn RecordStore) -> Result<(), BaasError> {
    store.health().await
}
