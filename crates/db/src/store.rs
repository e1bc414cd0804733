//! The generic collection API every backend implements.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page size used when walking a whole collection.
const FULL_LIST_BATCH: u32 = 500;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the BaaS layer.
#[derive(Debug, thiserror::Error)]
pub enum BaasError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("BaaS request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The BaaS answered with a non-2xx status.
    #[error("BaaS API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A record did not have the expected shape.
    #[error("BaaS record decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BaasError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BaasError::Api { status: 404, .. })
    }
}

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// A structured filter, rendered to the BaaS filter syntax by remote
/// stores and evaluated directly by in-memory ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field = value`. Empty relations compare equal to `""`, `null` and `false`.
    Eq(String, Value),
    /// `field != value`
    Ne(String, Value),
    /// `field ~ "text"`: case-insensitive substring match.
    Contains(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(field.to_string(), value.into())
    }

    pub fn contains(field: &str, text: &str) -> Self {
        Filter::Contains(field.to_string(), text.to_string())
    }

    /// `field = v1 || field = v2 || ...`
    pub fn any_of<S: AsRef<str>>(field: &str, values: &[S]) -> Self {
        Filter::Or(values.iter().map(|v| Filter::eq(field, v.as_ref())).collect())
    }

    /// Render into the BaaS filter expression syntax.
    pub fn render(&self) -> String {
        match self {
            Filter::Eq(field, value) => format!("{field} = {}", render_value(value)),
            Filter::Ne(field, value) => format!("{field} != {}", render_value(value)),
            Filter::Contains(field, text) => {
                format!("{field} ~ {}", radio_core::search::quote(text))
            }
            Filter::And(parts) => join(parts, " && "),
            Filter::Or(parts) => join(parts, " || "),
        }
    }
}

fn join(parts: &[Filter], sep: &str) -> String {
    match parts.len() {
        // An empty OR matches nothing; an empty AND matches everything.
        0 if sep == " || " => "id = \"\"".to_string(),
        0 => "id != \"\"".to_string(),
        1 => parts[0].render(),
        _ => {
            let rendered: Vec<String> = parts.iter().map(Filter::render).collect();
            format!("({})", rendered.join(sep))
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => radio_core::search::quote(s),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Options for a paginated list call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    /// Sort expression, e.g. `-created`.
    pub sort: Option<String>,
    pub filter: Option<Filter>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
            sort: None,
            filter: None,
        }
    }
}

impl ListQuery {
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// One page of a list call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl ListPage<Value> {
    /// Decode every item into a typed record.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ListPage<T>, BaasError> {
        let items = self
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(ListPage {
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items,
        })
    }
}

/// A binary file to attach to a record field.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of refreshing an auth token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRefresh {
    pub token: String,
    pub record: Value,
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Generic collection API of the BaaS.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// A handle to the same backend that sends `token` with every request.
    fn with_token(&self, token: &str) -> Arc<dyn RecordStore>;

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<ListPage<Value>, BaasError>;

    /// Fetch one record; `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, BaasError>;

    async fn create(&self, collection: &str, body: &Value) -> Result<Value, BaasError>;

    /// Patch the given fields of a record.
    async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value, BaasError>;

    /// Delete a record; `Ok(false)` when it did not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, BaasError>;

    /// Upload a file into a file field of a record.
    async fn attach_file(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        file: FileUpload,
    ) -> Result<Value, BaasError>;

    /// Validate and refresh an auth token against an auth collection.
    async fn auth_refresh(&self, collection: &str, token: &str) -> Result<AuthRefresh, BaasError>;

    async fn health(&self) -> Result<(), BaasError>;

    /// First record matching `filter`, if any.
    async fn first(
        &self,
        collection: &str,
        filter: Filter,
        sort: Option<&str>,
    ) -> Result<Option<Value>, BaasError> {
        let mut query = ListQuery::page(1, 1).filter(filter);
        query.sort = sort.map(str::to_string);
        let page = self.list(collection, &query).await?;
        Ok(page.items.into_iter().next())
    }

    /// Every record matching `filter`, walking pages until exhausted.
    async fn full_list(
        &self,
        collection: &str,
        filter: Option<Filter>,
        sort: Option<&str>,
    ) -> Result<Vec<Value>, BaasError> {
        let mut out = Vec::new();
        let mut page = 1;
        loop {
            let query = ListQuery {
                page,
                per_page: FULL_LIST_BATCH,
                sort: sort.map(str::to_string),
                filter: filter.clone(),
            };
            let batch = self.list(collection, &query).await?;
            let fetched = batch.items.len();
            out.extend(batch.items);
            if fetched < FULL_LIST_BATCH as usize || u64::from(page) >= batch.total_pages {
                break;
            }
            page += 1;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_nested_filters() {
        let filter = Filter::And(vec![
            Filter::eq("user", "u1"),
            Filter::eq("deleted", false),
            Filter::any_of("track", &["a", "b"]),
        ]);
        assert_eq!(
            filter.render(),
            r#"(user = "u1" && deleted = false && (track = "a" || track = "b"))"#
        );
    }

    #[test]
    fn renders_contains_and_quotes_input() {
        let filter = Filter::And(vec![
            Filter::contains("tags", "lo\"fi"),
            Filter::ne("id", "x"),
        ]);
        assert_eq!(filter.render(), r#"(tags ~ "lo\"fi" && id != "x")"#);
    }

    #[test]
    fn empty_or_matches_nothing() {
        assert_eq!(Filter::any_of::<&str>("id", &[]).render(), r#"id = """#);
    }

    #[test]
    fn decodes_list_page() {
        let page: ListPage<Value> = serde_json::from_value(json!({
            "page": 1, "perPage": 2, "totalItems": 1, "totalPages": 1,
            "items": [{"id": "a", "name": "x"}]
        }))
        .unwrap();
        #[derive(Deserialize)]
        struct Named {
            name: String,
        }
        let typed: ListPage<Named> = page.decode().unwrap();
        assert_eq!(typed.items[0].name, "x");
    }
}
