use super::core::CacheClient;
use super::execution::RequestExecutor;
use crate::config::Settings;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::transport::HttpTransport;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for [`CacheClient`].
///
/// Without explicit settings, `build` loads them from the configured file (if any)
/// plus the `INFINISPAN_*` environment variables.
pub struct CacheClientBuilder {
    settings: Option<Settings>,
    config_path: Option<PathBuf>,
    cache_name: Option<String>,
    retry: RetryConfig,
    auto_create: bool,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl CacheClientBuilder {
    pub fn new() -> Self {
        Self {
            settings: None,
            config_path: None,
            cache_name: None,
            retry: RetryConfig::default(),
            auto_create: true,
            base_url_override: None,
        }
    }

    /// Use already resolved settings instead of loading them.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Load settings from a JSON or YAML file.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Bind to `name` instead of the configured default cache.
    pub fn cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = Some(name.into());
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Create the cache on first write when it is missing (default: on).
    pub fn auto_create(mut self, enable: bool) -> Self {
        self.auto_create = enable;
        self
    }

    /// Replace `{protocol}://{host}:{port}` of the configured connection.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Build the client. No network access happens here.
    pub fn build(self) -> Result<CacheClient> {
        let settings = match self.settings {
            Some(s) => s,
            None => Settings::load(self.config_path.as_deref())?,
        };
        let policy = RetryPolicy::new(self.retry)?;
        let transport = HttpTransport::new_with_base_url(
            &settings.connection,
            self.base_url_override.as_deref(),
        )?;
        let cache_name = self
            .cache_name
            .unwrap_or_else(|| settings.cache_name.clone());

        Ok(CacheClient {
            settings: Arc::new(settings),
            executor: RequestExecutor::new(Arc::new(transport), Arc::new(policy)),
            cache_name,
            auto_create: self.auto_create,
        })
    }
}

impl Default for CacheClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
