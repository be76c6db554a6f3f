//! Protobuf schema registration.

use super::execution::{expect_success, RequestExecutor};
use crate::config::ConnectionSettings;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::transport::HttpTransport;
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Name under which the envelope schema is registered.
pub const CACHE_ENTRY_SCHEMA_NAME: &str = "cache_entry.proto";

/// Schema describing the `cache.CacheEntry` envelope stored by the cache client.
pub const CACHE_ENTRY_SCHEMA: &str = r#"syntax = "proto3";
package cache;

message CacheEntry {
    string value = 1;
    int64 created_at = 2;
    int64 updated_at = 3;
}
"#;

/// Registers and reads `.proto` schemas on the server.
#[derive(Clone)]
pub struct SchemaManager {
    executor: RequestExecutor,
}

impl SchemaManager {
    pub fn new(connection: &ConnectionSettings, retry: RetryConfig) -> Result<Self> {
        let transport = HttpTransport::new(connection)?;
        let policy = RetryPolicy::new(retry)?;
        Ok(Self::from_executor(RequestExecutor::new(
            Arc::new(transport),
            Arc::new(policy),
        )))
    }

    pub(crate) fn from_executor(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Upload `content` as schema `name`, replacing any previous version.
    pub async fn register_schema(&self, name: &str, content: &str) -> Result<()> {
        let url = self.executor.transport().url(&["schemas", name])?;
        let response = self
            .executor
            .call(
                "register_schema",
                Method::POST,
                url,
                Some((
                    Bytes::copy_from_slice(content.as_bytes()),
                    "text/plain".to_string(),
                )),
            )
            .await?;
        let response = expect_success(response)?;

        // The server accepts broken schemas but reports the problem in the body.
        if let Ok(report) = serde_json::from_slice::<Value>(&response.body) {
            if let Some(message) = report.get("error").filter(|e| !e.is_null()) {
                let message = message
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| message.to_string());
                return Err(Error::Remote {
                    status: response.status,
                    message: format!("schema '{}' rejected: {}", name, message),
                    retryable: false,
                });
            }
        }

        info!(schema = name, "schema registered");
        Ok(())
    }

    /// Contents of schema `name`, or `None` when it is not registered.
    pub async fn get_schema(&self, name: &str) -> Result<Option<String>> {
        let url = self.executor.transport().url(&["schemas", name])?;
        let response = self
            .executor
            .call("get_schema", Method::GET, url, None)
            .await?;
        if response.is_not_found() {
            return Ok(None);
        }
        Ok(Some(response.text()))
    }

    pub async fn schema_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_schema(name).await?.is_some())
    }

    /// Register the envelope schema unless it is already present.
    ///
    /// Returns `true` when it was registered by this call.
    pub async fn register_cache_entry_schema(&self) -> Result<bool> {
        if self.schema_exists(CACHE_ENTRY_SCHEMA_NAME).await? {
            return Ok(false);
        }
        self.register_schema(CACHE_ENTRY_SCHEMA_NAME, CACHE_ENTRY_SCHEMA)
            .await?;
        Ok(true)
    }
}
