// # IONOS DNS HTTP Transport
//
// reqwest-backed implementation of `ionos_dns_core::Transport`.
//
// ## Scope
//
// - ✅ One HTTP request per `send()` call
// - ✅ Request timeout from `ClientConfig::timeout_secs` (default 30 seconds)
// - ✅ User-Agent from `ClientConfig::user_agent`
// - ✅ Any HTTP status is returned as a response; the client classifies it
// - ❌ NO retry logic (owned by the reconciliation driver)
// - ❌ NO backoff logic (owned by the reconciliation driver)
// - ❌ NO interpretation of status codes or bodies (owned by `IonosClient`)
//
// ## Security Requirements
//
// - The API key travels in the request headers the client attaches
// - Header values are NEVER logged by this crate
//
// ## API Reference
//
// - IONOS DNS API v1: https://developer.hosting.ionos.com/docs/dns
// - Base URL: `https://api.hosting.ionos.com/dns/v1`

use async_trait::async_trait;
use ionos_dns_core::{
    ApiRequest, ApiResponse, ClientConfig, Error, IonosClient, Method, Result, Transport,
};
use std::time::Duration;

/// HTTP transport for the IONOS DNS API
///
/// # Example
///
/// ```rust,no_run
/// use ionos_dns_core::{ClientConfig, DesiredRecord, DnsProvider, RecordType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new(std::env::var("IONOS_API_KEY")?);
///     let client = ionos_dns_http::connect(&config)?;
///
///     let record = DesiredRecord::new("example.com", "www.example.com", RecordType::A, "192.0.2.10");
///     let outcome = client.ensure_matches(&record, true).await?;
///     println!("{}", outcome);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// API root the request paths are appended to
    base_url: String,

    /// Request timeout, kept for error messages
    timeout: Duration,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    ///
    /// Only the base URL, timeout and user agent are used here; the API key
    /// is attached per request by `IonosClient`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path (query string excluded)
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        tracing::debug!("HTTP {} {}", request.method, url);

        let mut builder = self
            .client
            .request(Self::method(request.method), &url)
            .header("Accept", "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::transport(format!(
                    "HTTP request timed out after {}s: {} {}",
                    self.timeout.as_secs(),
                    request.method,
                    request.path
                ))
            } else {
                Error::transport(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response body: {}", e)))?;

        tracing::debug!("HTTP {} {} -> {}", request.method, request.path, status);
        Ok(ApiResponse::new(status, body))
    }
}

/// Validate `config` and build a client that talks HTTP to the IONOS API
pub fn connect(config: &ClientConfig) -> Result<IonosClient<HttpTransport>> {
    config.validate()?;
    let transport = HttpTransport::new(config)?;
    IonosClient::from_config(transport, config)
}
