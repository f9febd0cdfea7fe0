use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::batch::Batch;
use crate::error::Error;
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::normalize::normalize;
use crate::paging::aggregate_pages;
use crate::request::ApiRequest;
use crate::retry::RetryPolicy;
use crate::types::{HttpRequest, Payload};

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Session settings for a [`GraphClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub access_token: Option<String>,
    pub base_url: String,
    /// Per-call timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Follow `paging.next` links and return the merged result.
    pub follow_paging: bool,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            follow_paging: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_follow_paging(mut self, follow_paging: bool) -> Self {
        self.follow_paging = follow_paging;
        self
    }

    /// Retry calls failing with the transient error code up to `retries`
    /// times, sleeping `delay` before each retry.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retry = RetryPolicy::new(retries, delay);
        self
    }
}

/// A blocking Graph API client.
///
/// Each [`request`](GraphClient::request) goes through the retry policy and
/// the response normalizer, then, when paging is enabled, follows every
/// continuation link before returning.
///
/// # Example
///
/// ```ignore
/// use graph_client::{ApiRequest, ClientConfig, GraphClient};
///
/// let graph = GraphClient::new(ClientConfig::default().with_access_token(token))?;
/// let profile = graph.get_object("me")?;
/// let friends = graph.request(ApiRequest::connections("me", "friends").with_arg("limit", "50"))?;
/// ```
pub struct GraphClient {
    config: ClientConfig,
    base_url: String,
    executor: Box<dyn HttpExecutor>,
}

impl GraphClient {
    /// Create a client that sends requests with reqwest.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config.timeout)?;
        Ok(Self::with_executor(config, executor))
    }

    /// Create a client with default settings and the given access token.
    pub fn with_access_token(access_token: impl Into<String>) -> Result<Self, Error> {
        Self::new(ClientConfig::default().with_access_token(access_token))
    }

    /// Create a client on top of a custom executor.
    pub fn with_executor(config: ClientConfig, executor: impl HttpExecutor + 'static) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            base_url,
            executor: Box::new(executor),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn access_token(&self) -> Option<&str> {
        self.config.access_token.as_deref()
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn executor(&self) -> &dyn HttpExecutor {
        self.executor.as_ref()
    }

    /// Start collecting calls for a single batch request.
    pub fn batch(&self) -> Batch<'_> {
        Batch::new(self)
    }

    /// Send a call and return its normalized result.
    ///
    /// With paging enabled, a JSON object result has its `paging` block
    /// removed, `data` holding every page's entries, and `pages_seen` set.
    pub fn request(&self, request: ApiRequest) -> Result<Payload, Error> {
        let request = request.with_credential(self.access_token());
        let url = format!("{}/{}", self.base_url, request.path);
        let http_request = request.to_http(url);

        debug!("Request ({}) to {}", http_request.method, http_request.url);
        let payload = self.config.retry.run(|| self.fetch(&http_request))?;

        if !self.config.follow_paging {
            return Ok(payload);
        }

        match payload {
            Payload::Json(Value::Object(first)) => {
                let merged = aggregate_pages(first, |next_url| {
                    debug!("Paged request (GET) to {}", next_url);
                    let page_request = HttpRequest::get(next_url);
                    self.config.retry.run(|| self.fetch(&page_request))
                })?;
                Ok(Payload::Json(Value::Object(merged)))
            }
            other => Ok(other),
        }
    }

    fn fetch(&self, request: &HttpRequest) -> Result<Payload, Error> {
        let response = self.executor.execute(request)?;
        Ok(normalize(&response)?)
    }
}
