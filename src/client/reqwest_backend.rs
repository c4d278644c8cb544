//! [`HttpClient`] backed by `reqwest`.
//!
//! # Examples
//!
//! ```ignore
//! use fetch_relay::client::{ClientConfig, FetchRequest, HttpClient, ReqwestClient};
//!
//! #[tokio::main]
//! async fn main() -> fetch_relay::Result<()> {
//!     let client = ReqwestClient::with_config(ClientConfig::default());
//!     let url = "http://example.com/api/data".parse()?;
//!     let mut response = client.execute(FetchRequest::get(url)).await?;
//!     println!("Status: {}", response.init.status);
//!     while let Some(chunk) = response.body.read_chunk().await? {
//!         println!("{} bytes", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```

use super::config::ClientConfig;
use super::transport::{ByteSource, FetchRequest, HttpClient, HttpResponse};
use crate::error::Result;
use crate::types::ResponseInit;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// The stock HTTP client.
///
/// Redirects, pooling and TLS are left to `reqwest`.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl ReqwestClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host);

        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if !config.proxy_url.is_empty() {
            match reqwest::Proxy::all(&config.proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!("Ignoring invalid proxy {}: {}", config.proxy_url, e),
            }
        }

        let client = builder.build().unwrap_or_default();

        ReqwestClient {
            client,
            config: Arc::new(config),
        }
    }

    /// Wrap an already configured `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestClient {
            client,
            config: Arc::new(ClientConfig::default()),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: FetchRequest) -> Result<HttpResponse> {
        let requested_url = request.url.clone();
        let mut req_builder = self.client.request(request.method, request.url);

        for (k, v) in &request.headers {
            req_builder = req_builder.header(k, v);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await?;
        let init = response_init(&response, &requested_url);

        Ok(HttpResponse {
            init,
            body: Box::new(ReqwestBody {
                stream: response.bytes_stream().boxed(),
            }),
        })
    }
}

fn response_init(response: &reqwest::Response, requested_url: &url::Url) -> ResponseInit {
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();

    ResponseInit {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        headers,
        url: response.url().to_string(),
        redirected: response.url() != requested_url,
    }
}

/// Body of a `reqwest` response; dropping it closes the connection.
struct ReqwestBody {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
}

#[async_trait]
impl ByteSource for ReqwestBody {
    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.stream.next().await.transpose()?)
    }
}
