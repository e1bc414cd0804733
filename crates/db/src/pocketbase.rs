//! REST client for a PocketBase-compatible BaaS.
//!
//! Wraps the generic collection API (`/api/collections/{name}/records`),
//! the auth-refresh endpoint and `/api/health` using [`reqwest`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::store::{AuthRefresh, BaasError, FileUpload, ListPage, ListQuery, RecordStore};

/// HTTP client for one BaaS instance.
///
/// Cheap to clone: the connection pool is shared. A handle created with
/// [`PocketBase::with_token`] sends the token on every request.
#[derive(Clone)]
pub struct PocketBase {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PocketBase {
    /// Create an anonymous client.
    ///
    /// * `base_url` - e.g. `https://pb.example.com` (trailing slash optional).
    /// * `timeout` - bound applied to every request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BaasError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A copy of this client that authenticates as `token`.
    pub fn authenticated(&self, token: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.to_string()),
        }
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{collection}/records", self.base_url)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{id}", self.records_url(collection))
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, token),
            None => builder,
        }
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, or a
    /// [`BaasError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BaasError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BaasError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BaasError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RecordStore for PocketBase {
    fn with_token(&self, token: &str) -> Arc<dyn RecordStore> {
        Arc::new(self.authenticated(token))
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<ListPage<Value>, BaasError> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("perPage", query.per_page.to_string()),
        ];
        if let Some(sort) = &query.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(filter) = &query.filter {
            params.push(("filter", filter.render()));
        }

        let response = self
            .request(reqwest::Method::GET, self.records_url(collection))
            .query(&params)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, BaasError> {
        let response = self
            .request(reqwest::Method::GET, self.record_url(collection, id))
            .send()
            .await?;
        match Self::parse_response(response).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, collection: &str, body: &Value) -> Result<Value, BaasError> {
        let response = self
            .request(reqwest::Method::POST, self.records_url(collection))
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value, BaasError> {
        let response = self
            .request(reqwest::Method::PATCH, self.record_url(collection, id))
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, BaasError> {
        let response = self
            .request(reqwest::Method::DELETE, self.record_url(collection, id))
            .send()
            .await?;
        match Self::ensure_success(response).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn attach_file(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        file: FileUpload,
    ) -> Result<Value, BaasError> {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = Form::new().part(field.to_string(), part);

        let response = self
            .request(reqwest::Method::PATCH, self.record_url(collection, id))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn auth_refresh(&self, collection: &str, token: &str) -> Result<AuthRefresh, BaasError> {
        let response = self
            .client
            .post(format!(
                "{}/api/collections/{collection}/auth-refresh",
                self.base_url
            ))
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn health(&self) -> Result<(), BaasError> {
        let response = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_collection_urls_without_double_slash() {
        let pb = PocketBase::with_client(reqwest::Client::new(), "https://pb.example.com/");
        assert_eq!(
            pb.records_url("radio_rooms"),
            "https://pb.example.com/api/collections/radio_rooms/records"
        );
        assert_eq!(
            pb.record_url("radio_rooms", "abc"),
            "https://pb.example.com/api/collections/radio_rooms/records/abc"
        );
    }

    #[test]
    fn authenticated_handle_keeps_base_url() {
        let pb = PocketBase::with_client(reqwest::Client::new(), "http://localhost:8090");
        let authed = pb.authenticated("tok");
        assert_eq!(authed.base_url(), "http://localhost:8090");
        assert_eq!(authed.token.as_deref(), Some("tok"));
        assert!(pb.token.is_none());
    }
}
