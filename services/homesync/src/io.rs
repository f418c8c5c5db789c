//! HTTP client abstraction for testability

use async_trait::async_trait;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A streaming response body read chunk by chunk
#[async_trait]
pub trait EventStream: Send {
    /// Next chunk of the body, `None` once the server closed the stream
    async fn next_chunk(&mut self) -> crate::Result<Option<Vec<u8>>>;
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a PUT request with a JSON body
    async fn put_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse>;

    /// Open a `text/event-stream` GET request
    async fn open_event_stream(&self, url: &str) -> crate::Result<Box<dyn EventStream>>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

struct ReqwestEventStream {
    url: String,
    response: reqwest::Response,
}

#[async_trait]
impl EventStream for ReqwestEventStream {
    async fn next_chunk(&mut self) -> crate::Result<Option<Vec<u8>>> {
        let chunk = self.response.chunk().await.map_err(|e| {
            crate::HomeSyncError::Http(format!("Reading stream {}: {}", self.url, e))
        })?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn put_json(&self, url: &str, body: &serde_json::Value) -> crate::Result<HttpResponse> {
        tracing::debug!("PUT {} {}", url, body);
        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| crate::HomeSyncError::Http(format!("PUT {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::HomeSyncError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("PUT {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn open_event_stream(&self, url: &str) -> crate::Result<Box<dyn EventStream>> {
        tracing::debug!("GET {} (event stream)", url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| crate::HomeSyncError::Http(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::HomeSyncError::Http(format!(
                "GET {} -> {}",
                url,
                status.as_u16()
            )));
        }

        Ok(Box::new(ReqwestEventStream {
            url: url.to_string(),
            response,
        }))
    }
}
