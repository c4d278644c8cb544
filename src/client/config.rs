//! Client configuration.

/// Options for the stock [`ReqwestClient`](super::ReqwestClient).
///
/// ```
/// use fetch_relay::client::ClientConfig;
///
/// let config = ClientConfig {
///     request_timeout_ms: Some(30_000),
///     ..Default::default()
/// };
/// assert_eq!(config.connect_timeout_ms, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Time allowed to establish a connection
    pub connect_timeout_ms: u64,
    /// Total time allowed for a request, body included. `None` disables it
    pub request_timeout_ms: Option<u64>,
    /// How long idle pooled connections are kept
    pub pool_idle_timeout_secs: u64,
    /// Idle connections kept per host
    pub max_idle_per_host: usize,
    /// Proxy for all traffic, empty for none
    pub proxy_url: String,
    /// `User-Agent` header, `None` for the client default
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            request_timeout_ms: None,
            pool_idle_timeout_secs: 90,
            max_idle_per_host: 32,
            proxy_url: String::new(),
            user_agent: None,
        }
    }
}
