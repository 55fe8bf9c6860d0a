//! SP-API HTTP client with retry.

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::auth::AccessToken;
use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::spapi::marketplace::Region;

const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";

/// One SP-API call, independent of endpoint and credentials.
#[derive(Debug, Clone)]
pub struct SpApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl SpApiRequest {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path as sent, before percent-encoding. For logs.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Decoded SP-API response.
#[derive(Debug, Clone)]
pub struct SpApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Client for the SP-API REST resources.
#[derive(Debug, Clone)]
pub struct SpApiClient {
    http: reqwest::Client,
    endpoint_override: Option<Url>,
    user_agent: String,
    retry: RetryPolicy,
}

impl SpApiClient {
    pub fn new(
        http: reqwest::Client,
        endpoint_override: Option<Url>,
        user_agent: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            endpoint_override,
            user_agent: user_agent.into(),
            retry,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &RelayConfig) -> RelayResult<Self> {
        let endpoint_override = config
            .upstream
            .endpoint_override
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| RelayError::Configuration(format!("invalid SP-API endpoint: {}", e)))?;

        Ok(Self::new(
            http,
            endpoint_override,
            config.upstream.user_agent.clone(),
            RetryPolicy::from_config(&config.retries),
        ))
    }

    /// Build the shared reqwest client used for LWA and SP-API calls.
    pub fn build_http(config: &RelayConfig) -> RelayResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .build()
            .map_err(RelayError::Transport)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Base URL serving `marketplace`.
    pub fn base_url(&self, marketplace: &str) -> RelayResult<Url> {
        match &self.endpoint_override {
            Some(url) => Ok(url.clone()),
            None => {
                let endpoint = Region::for_marketplace(marketplace).endpoint();
                Url::parse(endpoint)
                    .map_err(|e| RelayError::Configuration(format!("invalid SP-API endpoint: {}", e)))
            }
        }
    }

    fn url_for(&self, marketplace: &str, request: &SpApiRequest) -> RelayResult<Url> {
        let mut url = self.base_url(marketplace)?;
        if url.cannot_be_a_base() {
            return Err(RelayError::Configuration(format!(
                "SP-API endpoint {} cannot carry a path",
                url
            )));
        }
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&request.segments);
        }
        Ok(url)
    }

    /// Issue `request` with the retry policy applied.
    pub async fn call(
        &self,
        token: &AccessToken,
        marketplace: &str,
        request: &SpApiRequest,
    ) -> RelayResult<SpApiResponse> {
        let url = self.url_for(marketplace, request)?;
        tracing::debug!(method = %request.method, path = %request.path(), "Calling SP-API");
        self.retry
            .execute(|| self.send_once(Some(token), &url, request))
            .await
    }

    /// Download a document referenced by an SP-API response (pre-signed URL).
    pub async fn fetch_document(&self, location: &str) -> RelayResult<Value> {
        let url = Url::parse(location)
            .map_err(|e| RelayError::InvalidRequest(format!("invalid document link: {}", e)))?;
        let request = SpApiRequest::new(Method::GET, Vec::<String>::new());
        let response = self
            .retry
            .execute(|| self.send_once(None, &url, &request))
            .await?;
        Ok(response.body)
    }

    async fn send_once(
        &self,
        token: Option<&AccessToken>,
        url: &Url,
        request: &SpApiRequest,
    ) -> RelayResult<SpApiResponse> {
        let start = Instant::now();
        let method_label = request.method.as_str();

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            builder = builder.header(ACCESS_TOKEN_HEADER, token.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream(method_label, None, start);
                return Err(RelayError::Transport(e));
            }
        };

        let status = response.status();
        let text = response.text().await?;
        metrics::record_upstream(method_label, Some(status.as_u16()), start);

        let body = parse_body(&text);
        if !status.is_success() {
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                message: upstream_message(status, &body),
            });
        }

        Ok(SpApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Human-readable message for a failed SP-API response.
///
/// SP-API reports `{"errors": [{"code", "message", "details"}]}`.
pub(crate) fn upstream_message(status: StatusCode, body: &Value) -> String {
    body.pointer("/errors/0/message")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()))
}
