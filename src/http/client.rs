//! HTTP client setup.
//!
//! One client is built per [`Mirror`](crate::Mirror) and shared by the catalog
//! walk and every download worker. Retries are not delegated to middleware: the
//! fixed-delay [`RetryPolicy`](crate::RetryPolicy) owns them so that attempt
//! counts stay exact.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Proxy;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Longest pause allowed between two reads of a response body.
    pub read_timeout: Duration,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            read_timeout: Duration::from_secs(40),
            proxy: None,
            headers: None,
        }
    }
}

/// Creates an HTTP client with tracing middleware.
///
/// ```rust
/// use civitai_mirror::http::{create_http_client, HttpClientConfig};
///
/// let client = create_http_client(HttpClientConfig::default()).unwrap();
/// ```
pub fn create_http_client(config: HttpClientConfig) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("civitai-mirror/", env!("CARGO_PKG_VERSION"))),
    );
    if let Some(extra) = config.headers {
        headers.extend(extra);
    }

    let mut inner_client_builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .default_headers(headers);

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        // Trace HTTP requests. See the tracing crate to make use of these traces.
        .with(TracingMiddleware::default())
        .build();

    Ok(client)
}
