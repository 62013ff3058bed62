use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::FetchError;

/// Raw body chunks as they arrive off the wire.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

const NDJSON: &str = "application/x-ndjson";

/// A request handed to a [`StreamFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    /// Serialised as a JSON body when present
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        FetchRequest {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }

    /// GET that asks for newline-delimited JSON.
    pub fn ndjson(url: impl Into<String>) -> Self {
        Self::get(url).header("Accept", NDJSON)
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        FetchRequest {
            url: url.into(),
            method: Method::POST,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// An open response body. Only produced for success statuses.
pub struct OpenStream {
    pub status: u16,
    pub body: ByteStream,
}

impl std::fmt::Debug for OpenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStream")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Transport seam: opens a request and exposes its body as a byte stream.
///
/// Implementations fail with `Network` when no connection could be made and
/// with `HttpStatus` for non-success responses; in both cases no body is
/// returned. Dropping the returned body must release the connection.
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    async fn open(&self, request: &FetchRequest) -> Result<OpenStream, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// [`StreamFetcher`] backed by reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        // No overall request timeout here: the session deadline owns that,
        // and a client-level timeout would cut long streams short.
        let http = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFetcher { http })
    }

    pub fn with_client(http: Client) -> Self {
        HttpFetcher { http }
    }
}

#[async_trait]
impl StreamFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn open(&self, request: &FetchRequest) -> Result<OpenStream, FetchError> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.http.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| FetchError::Network {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let url = request.url.clone();
        let body = resp
            .bytes_stream()
            .map(move |chunk| {
                chunk.map(|b| b.to_vec()).map_err(|e| FetchError::Network {
                    url: url.clone(),
                    message: e.to_string(),
                })
            })
            .boxed();

        Ok(OpenStream {
            status: status.as_u16(),
            body,
        })
    }
}
