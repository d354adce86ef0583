//! HTTP blob backend.
//!
//! Fetches `GET <base_url>/<location>` with an optional bearer token. Works
//! against any object store that exposes objects over plain HTTP(S), such as
//! a signed-URL gateway or a static file server in front of a bucket.

use std::time::Duration;

use async_trait::async_trait;
use promptdesk_shared::{BlobStore, PromptDeskError, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

/// User-Agent string for blob requests.
const USER_AGENT: &str = concat!("PromptDesk/", env!("CARGO_PKG_VERSION"));

/// Maximum response size we accept for a single document (25 MB).
const MAX_RESPONSE_SIZE: u64 = 25 * 1024 * 1024;

/// Blob store that downloads objects over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBlobStore {
    /// Create a store for `base_url`. `token` is sent as `Authorization: Bearer ...`.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PromptDeskError::config(format!("invalid blob base_url '{base_url}': {e}")))?;

        if base_url.cannot_be_a_base() {
            return Err(PromptDeskError::config(format!(
                "blob base_url '{base_url}' cannot be used as a base"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(3))
            .timeout(timeout)
            .build()
            .map_err(|e| PromptDeskError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Build the object URL for `location`, percent-encoding each path segment.
    pub fn object_url(&self, location: &str) -> Result<Url> {
        let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(PromptDeskError::validation("blob location must not be empty"));
        }
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(PromptDeskError::validation(format!(
                "blob location '{location}' contains relative segments"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PromptDeskError::config("blob base_url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    fn backend(&self) -> &str {
        "http"
    }

    #[instrument(skip_all, fields(location = %location))]
    async fn fetch_text(&self, location: &str) -> Result<String> {
        let url = self.object_url(location)?;
        debug!(%url, "fetching blob");

        let mut request = self.client.get(url.as_str());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PromptDeskError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PromptDeskError::NotFound(format!("blob {location}")));
        }
        if !status.is_success() {
            return Err(PromptDeskError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(PromptDeskError::Network(format!(
                    "{url}: response too large ({len} bytes)"
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PromptDeskError::Network(format!("{url}: body read failed: {e}")))?;

        if bytes.len() as u64 > MAX_RESPONSE_SIZE {
            return Err(PromptDeskError::Network(format!(
                "{url}: response too large ({} bytes)",
                bytes.len()
            )));
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, token: Option<&str>) -> HttpBlobStore {
        HttpBlobStore::new(
            &format!("{}/knowledge/", server.uri()),
            token.map(String::from),
            Duration::from_secs(5),
        )
        .expect("build store")
    }

    #[test]
    fn object_url_encodes_segments() {
        let store = HttpBlobStore::new(
            "https://blobs.example.com/knowledge",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let url = store.object_url("buyer-1/Supplier Terms.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://blobs.example.com/knowledge/buyer-1/Supplier%20Terms.txt"
        );
    }

    #[test]
    fn object_url_rejects_relative_segments() {
        let store =
            HttpBlobStore::new("https://blobs.example.com/", None, Duration::from_secs(5)).unwrap();
        assert!(store.object_url("../secrets").is_err());
        assert!(store.object_url("").is_err());
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = HttpBlobStore::new("not a url", None, Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[tokio::test]
    async fn fetches_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knowledge/buyer-1/policy.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Preferred suppliers only."))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let text = store.fetch_text("buyer-1/policy.txt").await.expect("fetch");
        assert_eq!(text, "Preferred suppliers only.");
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knowledge/doc.txt"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("authorized"))
            .mount(&server)
            .await;

        let store = store_for(&server, Some("s3cret"));
        assert_eq!(store.fetch_text("doc.txt").await.unwrap(), "authorized");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let err = store.fetch_text("gone.txt").await.unwrap_err();
        assert!(matches!(err, PromptDeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let err = store.fetch_text("doc.txt").await.unwrap_err();
        assert!(matches!(err, PromptDeskError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start().await;
        let body = vec![b'a'; (MAX_RESPONSE_SIZE + 1024 * 1024) as usize];
        Mock::given(method("GET"))
            .and(path("/knowledge/big.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let err = store.fetch_text("big.txt").await.unwrap_err();
        assert!(matches!(err, PromptDeskError::Network(_)));
        assert!(err.to_string().contains("too large"));
    }
}
