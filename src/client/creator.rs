//! 缓存创建：按配置在服务端创建分布式缓存。
//!
//! Creates caches on the server from [`CacheSettings`] and checks existing ones for
//! compatibility.

use super::definition::{build_definition, is_compatible};
use super::execution::{expect_success, RequestExecutor};
use crate::config::{CacheSettings, ConnectionSettings};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::transport::HttpTransport;
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creates caches through the REST API.
#[derive(Clone)]
pub struct CacheCreator {
    executor: RequestExecutor,
}

impl CacheCreator {
    /// Standalone creator talking to the server described by `connection`.
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

    /// `HEAD /caches/{name}`: 2xx means present, 404 absent.
    pub async fn cache_exists(&self, name: &str) -> Result<bool> {
        let url = self.executor.transport().url(&["caches", name])?;
        let response = self
            .executor
            .call("cache_exists", Method::HEAD, url, None)
            .await?;
        Ok(response.is_success())
    }

    /// The server's definition of `name`, or `None` when the cache does not exist.
    pub async fn cache_definition(&self, name: &str) -> Result<Option<Value>> {
        let url = self
            .executor
            .transport()
            .action_url(&["caches", name], "config")?;
        let response = self
            .executor
            .call("cache_definition", Method::GET, url, None)
            .await?;
        if response.is_not_found() {
            return Ok(None);
        }
        let definition = serde_json::from_slice(&response.body).map_err(|e| {
            Error::decode(format!("cache definition for '{}' is not JSON: {}", name, e))
        })?;
        Ok(Some(definition))
    }

    /// Create `name` from `config`.
    ///
    /// Returns `true` when the cache was created or already exists with a compatible
    /// definition, `false` when it exists with an incompatible one.
    pub async fn create_cache(&self, name: &str, config: &CacheSettings) -> Result<bool> {
        let desired = build_definition(config);

        if self.cache_exists(name).await? {
            return self.check_existing(name, &desired).await;
        }

        let body = serde_json::to_vec(&desired)?;
        let url = self.executor.transport().url(&["caches", name])?;
        let created = self
            .executor
            .call(
                "create_cache",
                Method::POST,
                url,
                Some((Bytes::from(body), "application/json".to_string())),
            )
            .await;
        let response = match created {
            // Lost a creation race: the cache appeared between the check and the POST.
            Err(e) if e.status() == Some(409) => {
                return self.check_existing(name, &desired).await;
            }
            other => other?,
        };
        expect_success(response)?;

        info!(
            cache = name,
            memory_size = config.memory_size.as_str(),
            ttl_hours = config.ttl_hours,
            "cache created"
        );
        Ok(true)
    }

    async fn check_existing(&self, name: &str, desired: &Value) -> Result<bool> {
        let Some(existing) = self.cache_definition(name).await? else {
            // Removed again in the meantime; the caller may simply retry.
            return Ok(false);
        };
        if is_compatible(&existing, desired) {
            debug!(cache = name, "cache already exists with a compatible definition");
            Ok(true)
        } else {
            warn!(
                cache = name,
                "cache already exists with an incompatible definition"
            );
            Ok(false)
        }
    }
}
