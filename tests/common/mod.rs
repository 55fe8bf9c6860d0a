//! Shared utilities for relay integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use serde_json::{json, Value};
use sp_api_relay::config::Environment;
use sp_api_relay::{HttpServer, RelayConfig, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/auth/o2/token";
pub const ACCESS_TOKEN: &str = "Atza|integration";
pub const SELLER_ID: &str = "A1SELLER";
pub const MARKETPLACE_ID: &str = "A1PA6795UKMFR9";

/// A relay bound to an ephemeral port. Shuts down when dropped.
pub struct TestRelay {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestRelay {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub async fn post(&self, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url())
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// POST and decode the envelope.
    pub async fn invoke(&self, body: Value) -> (u16, Value) {
        let res = self.post(body).await;
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
        self.handle.abort();
    }
}

/// Config pointing every upstream at `upstream`, with fast retries and no
/// pacing.
pub fn test_config(upstream: &MockServer) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.token_url = format!("{}{}", upstream.uri(), TOKEN_PATH);
    config.upstream.endpoint_override = Some(upstream.uri());
    config.upstream.inter_call_delay_ms = 0;
    config.retries.max_attempts = 3;
    config.retries.base_delay_ms = 5;
    config.retries.max_delay_ms = 20;
    config.observability.metrics_enabled = false;
    config
}

pub async fn start_relay(config: RelayConfig) -> TestRelay {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestRelay {
        addr,
        shutdown,
        handle,
    }
}

pub async fn start_dev_relay(upstream: &MockServer) -> TestRelay {
    let mut config = test_config(upstream);
    config.runtime.environment = Environment::Development;
    start_relay(config).await
}

/// LWA endpoint that issues [`ACCESS_TOKEN`], expected `times` times.
pub async fn mount_token(upstream: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(times)
        .mount(upstream)
        .await;
}

pub fn credentials() -> Value {
    json!({
        "lwaClientId": "amzn1.application-oa2-client.test",
        "lwaClientSecret": "secret",
        "refreshToken": "Atzr|refresh",
        "sellerId": SELLER_ID,
    })
}

/// Request body for `operation` with the standard credentials and the
/// fields of `payload` merged in.
pub fn request(operation: &str, payload: Value) -> Value {
    let mut body = json!({
        "operation": operation,
        "marketplace": "DE",
        "marketplaceId": MARKETPLACE_ID,
        "credentials": credentials(),
    });
    if let (Some(body), Value::Object(payload)) = (body.as_object_mut(), payload) {
        body.extend(payload);
    }
    body
}

pub fn listing_path(sku: &str) -> String {
    format!("/listings/2021-08-01/items/{}/{}", SELLER_ID, sku)
}
