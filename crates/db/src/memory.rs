//! In-process [`RecordStore`] used by tests and offline development.
//!
//! Mirrors the BaaS behaviour the repositories rely on: generated 15-char
//! ids, `created`/`updated` stamps, patch semantics on update, structured
//! filters and single-field sorting. File uploads store the file name in the
//! field and keep the bytes aside for inspection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::store::{AuthRefresh, BaasError, FileUpload, Filter, ListPage, ListQuery, RecordStore};

#[derive(Default)]
struct Inner {
    /// Records per collection, in insertion order.
    collections: HashMap<String, Vec<Value>>,
    /// Uploaded files keyed by `(collection, id, field)`.
    files: HashMap<(String, String, String), FileUpload>,
    /// Valid auth tokens mapped to `(collection, user id)`.
    sessions: HashMap<String, (String, String)>,
    next_id: u64,
    next_token: u64,
    last_stamp: Option<chrono::DateTime<Utc>>,
}

impl Inner {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("r{:014}", self.next_id)
    }

    /// Strictly increasing timestamps so `-created` ordering is deterministic.
    fn stamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::milliseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string()
    }

    fn records(&mut self, collection: &str) -> &mut Vec<Value> {
        self.collections.entry(collection.to_string()).or_default()
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    token: Option<String>,
    /// Fail every request with this status when set.
    failing: Arc<Mutex<Option<u16>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token this handle was created with, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Register `token` as a valid session for the user record `user_id`.
    pub async fn insert_session(&self, token: &str, collection: &str, user_id: &str) {
        self.inner.lock().await.sessions.insert(
            token.to_string(),
            (collection.to_string(), user_id.to_string()),
        );
    }

    /// Insert a record verbatim, generating `id` and stamps when missing.
    pub async fn seed(&self, collection: &str, record: Value) -> Value {
        let mut inner = self.inner.lock().await;
        let record = prepare_new(&mut inner, record);
        inner.records(collection).push(record.clone());
        record
    }

    /// All records of a collection, in insertion order.
    pub async fn dump(&self, collection: &str) -> Vec<Value> {
        self.inner
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// The uploaded file stored in a record field.
    pub async fn file(&self, collection: &str, id: &str, field: &str) -> Option<FileUpload> {
        self.inner
            .lock()
            .await
            .files
            .get(&(collection.to_string(), id.to_string(), field.to_string()))
            .cloned()
    }

    /// Make every subsequent call fail with `status` (`None` to recover).
    pub async fn set_failing(&self, status: Option<u16>) {
        *self.failing.lock().await = status;
    }

    async fn check_failing(&self) -> Result<(), BaasError> {
        match *self.failing.lock().await {
            Some(status) => Err(BaasError::Api {
                status,
                body: "simulated failure".into(),
            }),
            None => Ok(()),
        }
    }
}

fn prepare_new(inner: &mut Inner, record: Value) -> Value {
    let mut map = match record {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let has_id = map
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if !has_id {
        map.insert("id".into(), Value::String(inner.next_id()));
    }
    let stamp = inner.stamp();
    map.entry("created").or_insert_with(|| Value::String(stamp.clone()));
    map.insert("updated".into(), Value::String(stamp));
    Value::Object(map)
}

fn not_found(collection: &str, id: &str) -> BaasError {
    BaasError::Api {
        status: 404,
        body: format!("{collection}/{id} not found"),
    }
}

// ---------------------------------------------------------------------------
// Filter evaluation
// ---------------------------------------------------------------------------

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Object(_)) => false,
    }
}

fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    if is_empty(Some(expected)) && is_empty(actual) {
        return true;
    }
    match (actual, expected) {
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(a), b) => a == b,
        (None, _) => false,
    }
}

fn matches(record: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(field, value) => values_equal(record.get(field), value),
        Filter::Ne(field, value) => !values_equal(record.get(field), value),
        Filter::Contains(field, text) => record
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(&text.to_lowercase())),
        Filter::And(parts) => parts.iter().all(|f| matches(record, f)),
        Filter::Or(parts) => parts.iter().any(|f| matches(record, f)),
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> std::cmp::Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (x, y) => is_empty(y).cmp(&is_empty(x)),
    }
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[async_trait]
impl RecordStore for MemoryStore {
    fn with_token(&self, token: &str) -> Arc<dyn RecordStore> {
        Arc::new(MemoryStore {
            inner: Arc::clone(&self.inner),
            token: Some(token.to_string()),
            failing: Arc::clone(&self.failing),
        })
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<ListPage<Value>, BaasError> {
        self.check_failing().await?;
        let inner = self.inner.lock().await;
        let mut items: Vec<Value> = inner
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.filter.as_ref().is_none_or(|f| matches(r, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort.trim_start_matches('+'), false),
            };
            items.sort_by(|a, b| {
                let ord = compare_field(a, b, field);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let per_page = query.per_page.max(1);
        let page = query.page.max(1);
        let total_items = items.len() as u64;
        let total_pages = total_items.div_ceil(u64::from(per_page));
        let items = items
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect();

        Ok(ListPage {
            page,
            per_page,
            total_items,
            total_pages,
            items,
        })
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, BaasError> {
        self.check_failing().await?;
        let inner = self.inner.lock().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| r["id"] == id))
            .cloned())
    }

    async fn create(&self, collection: &str, body: &Value) -> Result<Value, BaasError> {
        self.check_failing().await?;
        let mut inner = self.inner.lock().await;
        let record = prepare_new(&mut inner, body.clone());
        inner.records(collection).push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value, BaasError> {
        self.check_failing().await?;
        let mut inner = self.inner.lock().await;
        let stamp = inner.stamp();
        let record = inner
            .records(collection)
            .iter_mut()
            .find(|r| r["id"] == id)
            .ok_or_else(|| not_found(collection, id))?;

        if let (Value::Object(target), Value::Object(patch)) = (&mut *record, body) {
            for (key, value) in patch {
                if key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
            target.insert("updated".into(), Value::String(stamp));
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, BaasError> {
        self.check_failing().await?;
        let mut inner = self.inner.lock().await;
        let records = inner.records(collection);
        let before = records.len();
        records.retain(|r| r["id"] != id);
        Ok(records.len() != before)
    }

    async fn attach_file(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        file: FileUpload,
    ) -> Result<Value, BaasError> {
        self.check_failing().await?;
        let mut inner = self.inner.lock().await;
        let file_name = file.file_name.clone();
        inner.files.insert(
            (collection.to_string(), id.to_string(), field.to_string()),
            file,
        );
        let record = inner
            .records(collection)
            .iter_mut()
            .find(|r| r["id"] == id)
            .ok_or_else(|| not_found(collection, id))?;
        record[field] = Value::String(file_name);
        Ok(record.clone())
    }

    async fn auth_refresh(&self, collection: &str, token: &str) -> Result<AuthRefresh, BaasError> {
        self.check_failing().await?;
        let mut inner = self.inner.lock().await;
        let unauthorized = || BaasError::Api {
            status: 401,
            body: "The request requires valid record authorization token.".into(),
        };
        let (auth_collection, user_id) = inner.sessions.get(token).cloned().ok_or_else(unauthorized)?;
        if auth_collection != collection {
            return Err(unauthorized());
        }
        let record = inner
            .collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| r["id"] == user_id.as_str()))
            .cloned()
            .ok_or_else(|| not_found(collection, &user_id))?;

        // Earlier tokens stay valid, as they do until expiry in PocketBase.
        inner.next_token += 1;
        let fresh = format!("refreshed-{:06}", inner.next_token);
        inner.sessions.insert(fresh.clone(), (auth_collection, user_id));
        Ok(AuthRefresh {
            token: fresh,
            record,
        })
    }

    async fn health(&self) -> Result<(), BaasError> {
        self.check_failing().await
    }
}
