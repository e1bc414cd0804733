//! Download of generated media for storage in the BaaS.

use std::time::Duration;

use async_trait::async_trait;

use crate::api::SunoApiError;

/// A downloaded media file.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Something that can fetch a media URL.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<MediaFile, SunoApiError>;
}

/// Fetches media over HTTP.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new(timeout: Duration) -> Result<Self, SunoApiError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

/// The last path segment of a URL, without query string, or `fallback`.
pub fn file_name_from_url(url: &str, fallback: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty() && name.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<MediaFile, SunoApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SunoApiError::ApiError {
                status: status.as_u16(),
                body: format!("media download failed for {url}"),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(MediaFile {
            file_name: file_name_from_url(url, "media.bin"),
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_strips_query() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/a/e231.mp3?sig=1", "x.bin"),
            "e231.mp3"
        );
        assert_eq!(file_name_from_url("https://cdn.example.com/stream/e231", "audio.mp3"), "audio.mp3");
    }
}
