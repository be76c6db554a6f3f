//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use infinispan_rest_client::config::{CacheSettings, Settings};
use infinispan_rest_client::{CacheClient, CacheClientBuilder, RetryConfig};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const CACHE: &str = "sessions";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

/// Millisecond delays so retry tests stay fast.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig::new()
        .with_max_retries(max_retries)
        .with_initial_delay(Duration::from_millis(1))
        .with_backoff_multiplier(2.0)
        .with_max_delay(Duration::from_millis(5))
}

pub fn settings() -> Settings {
    Settings::default().with_cache(CACHE, CacheSettings::default())
}

pub fn cache_path() -> String {
    format!("/rest/v2/caches/{}", CACHE)
}

pub fn key_path(key: &str) -> String {
    format!("/rest/v2/caches/{}/{}", CACHE, key)
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client bound to [`CACHE`] talking to the mock server.
    pub fn client(&self, retry: RetryConfig) -> CacheClient {
        CacheClientBuilder::new()
            .settings(settings())
            .cache_name(CACHE)
            .retry_config(retry)
            .base_url_override(&self.base_url)
            .build()
            .expect("client builds")
    }

    /// Respond to `method path` with `status` and `body`, without query parameters.
    pub async fn mock(&self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    /// Respond to `method /caches/{CACHE}?action=<action>`.
    pub async fn mock_action(&self, method: &str, action: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, Matcher::Exact(cache_path()))
            .match_query(Matcher::UrlEncoded("action".into(), action.into()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// The bound cache answers `HEAD` with 200.
    pub async fn mock_cache_present(&self) -> Mock {
        self.mock("HEAD", &cache_path(), 200, "").await
    }
}
