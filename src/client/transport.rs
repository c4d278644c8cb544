//! HTTP client seam.
//!
//! An exchange only needs two capabilities from an HTTP library: issue a request
//! and resolve with the response head, then hand out the body chunk by chunk.
//! Any library implementing [`HttpClient`] and [`ByteSource`] can back an
//! exchange; [`ReqwestClient`](super::ReqwestClient) is the stock one.

use crate::error::Result;
use crate::types::{RequestInit, ResponseInit};
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use url::Url;

/// An outbound request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Target URL
    pub url: Url,
    /// HTTP method
    pub method: Method,
    /// Extra headers, sent in order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<Bytes>,
}

impl FetchRequest {
    /// A bodiless `GET` for `url`.
    pub fn get(url: Url) -> Self {
        Self::new(url, RequestInit::default())
    }

    /// A request for `url` shaped by `init`.
    pub fn new(url: Url, init: RequestInit) -> Self {
        Self {
            url,
            method: init.method,
            headers: init.headers,
            body: init.body,
        }
    }
}

/// Response head plus a pull-based body.
pub struct HttpResponse {
    /// Status, headers and final URL
    pub init: ResponseInit,
    /// Body source, dropped to close the response
    pub body: Box<dyn ByteSource>,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("init", &self.init)
            .finish_non_exhaustive()
    }
}

/// Issues requests on behalf of exchanges.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send `request` and resolve once the response head is available.
    async fn execute(&self, request: FetchRequest) -> Result<HttpResponse>;
}

/// Pull-based response body.
#[async_trait]
pub trait ByteSource: Send {
    /// Next chunk of the body, or `None` once it is exhausted.
    async fn read_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// A body held entirely in memory, yielded chunk by chunk.
#[derive(Debug, Default, Clone)]
pub struct MemoryBody {
    chunks: VecDeque<Bytes>,
}

impl MemoryBody {
    /// Body yielding `chunks` in order.
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ByteSource for MemoryBody {
    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

/// Body fed from a channel; exhausted once every sender is dropped.
#[async_trait]
impl ByteSource for mpsc::UnboundedReceiver<Result<Bytes>> {
    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        self.recv().await.transpose()
    }
}
