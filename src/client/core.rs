use super::creator::CacheCreator;
use super::execution::{expect_success, RequestExecutor};
use super::schema::SchemaManager;
use crate::codec;
use crate::config::{Settings, PROTOSTREAM_MEDIA_TYPE};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Client bound to one named cache.
///
/// Cheap to clone; clones share the connection pool and the retry policy. Every
/// operation is an independent round trip, nothing is cached locally.
#[derive(Clone)]
pub struct CacheClient {
    pub(crate) settings: Arc<Settings>,
    pub(crate) executor: RequestExecutor,
    pub(crate) cache_name: String,
    pub(crate) auto_create: bool,
}

impl CacheClient {
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// A client for another cache sharing this client's connection and retry policy.
    pub fn with_cache(&self, name: impl Into<String>) -> Self {
        Self {
            cache_name: name.into(),
            ..self.clone()
        }
    }

    /// Cache creator sharing this client's connection.
    pub fn creator(&self) -> CacheCreator {
        CacheCreator::from_executor(self.executor.clone())
    }

    /// Schema manager sharing this client's connection.
    pub fn schemas(&self) -> SchemaManager {
        SchemaManager::from_executor(self.executor.clone())
    }

    fn value_media_type(&self) -> &str {
        self.settings
            .caches
            .get(&self.cache_name)
            .map(|c| c.encoding.value.media_type.as_str())
            .unwrap_or(PROTOSTREAM_MEDIA_TYPE)
    }

    fn key_url(&self, key: &str) -> Result<url::Url> {
        self.executor
            .transport()
            .url(&["caches", &self.cache_name, key])
    }

    fn action_url(&self, action: &str) -> Result<url::Url> {
        self.executor
            .transport()
            .action_url(&["caches", &self.cache_name], action)
    }

    /// Store `value` under `key`, overwriting any previous value.
    pub async fn put(&self, key: &str, value: &Value) -> Result<()> {
        let body = codec::encode_body(value)?;
        self.put_body(key, body).await
    }

    /// Store any serializable value under `key`.
    pub async fn put_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let envelope = codec::encode_as(value)?;
        let body = serde_json::to_vec(&envelope)?;
        self.put_body(key, body).await
    }

    async fn put_body(&self, key: &str, body: Vec<u8>) -> Result<()> {
        if self.auto_create && !self.ensure_cache_exists().await? {
            return Err(Error::configuration(format!(
                "cache '{}' exists with a definition incompatible with the configured settings",
                self.cache_name
            )));
        }

        let url = self.key_url(key)?;
        let content_type = self.value_media_type().to_string();
        let response = self
            .executor
            .call("put", Method::PUT, url, Some((Bytes::from(body), content_type)))
            .await?;
        expect_success(response)?;

        info!(cache = self.cache_name.as_str(), key, "value stored");
        Ok(())
    }

    /// Value stored under `key`, or `None` when absent.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.get_body(key).await? {
            Some(body) => codec::decode_body(&body).map(Some),
            None => Ok(None),
        }
    }

    /// Value stored under `key` deserialized into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_body(key).await? {
            Some(body) => {
                let envelope = serde_json::from_slice(&body)
                    .map_err(|e| Error::decode(format!("malformed envelope: {}", e)))?;
                codec::decode_as(&envelope).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Stored body for `key` as text, without decoding the envelope.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_body(key)
            .await?
            .map(|body| String::from_utf8_lossy(&body).into_owned()))
    }

    async fn get_body(&self, key: &str) -> Result<Option<Bytes>> {
        let url = self.key_url(key)?;
        let response = self.executor.call("get", Method::GET, url, None).await?;
        if response.is_not_found() {
            debug!(cache = self.cache_name.as_str(), key, "key not found");
            return Ok(None);
        }
        Ok(Some(response.body))
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let url = self.key_url(key)?;
        let response = self
            .executor
            .call("exists", Method::HEAD, url, None)
            .await?;
        Ok(response.is_success())
    }

    /// Remove `key`. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let url = self.key_url(key)?;
        let response = self
            .executor
            .call("delete", Method::DELETE, url, None)
            .await?;
        if response.is_not_found() {
            debug!(cache = self.cache_name.as_str(), key, "delete of absent key");
        } else {
            info!(cache = self.cache_name.as_str(), key, "value deleted");
        }
        Ok(())
    }

    /// Remove every entry of the cache.
    pub async fn clear_cache(&self) -> Result<()> {
        let url = self.action_url("clear")?;
        let response = self
            .executor
            .call("clear_cache", Method::POST, url, None)
            .await?;
        expect_success(response)?;
        info!(cache = self.cache_name.as_str(), "cache cleared");
        Ok(())
    }

    pub async fn get_all_keys(&self) -> Result<Vec<String>> {
        let url = self.action_url("keys")?;
        let response = self
            .executor
            .call("get_all_keys", Method::GET, url, None)
            .await?;
        let response = expect_success(response)?;
        let keys: Vec<Value> = serde_json::from_slice(&response.body)
            .map_err(|e| Error::decode(format!("key listing is not a JSON array: {}", e)))?;
        Ok(keys
            .into_iter()
            .map(|k| match k {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }

    /// Server-side statistics as reported by the server.
    pub async fn get_cache_stats(&self) -> Result<Map<String, Value>> {
        let url = self.action_url("stats")?;
        let response = self
            .executor
            .call("get_cache_stats", Method::GET, url, None)
            .await?;
        let response = expect_success(response)?;
        match serde_json::from_slice(&response.body) {
            Ok(Value::Object(stats)) => Ok(stats),
            Ok(other) => Err(Error::decode(format!(
                "cache statistics are not a JSON object: {}",
                other
            ))),
            Err(e) => Err(Error::decode(format!("cache statistics are not JSON: {}", e))),
        }
    }

    /// Whether the bound cache exists on the server.
    pub async fn cache_exists(&self) -> Result<bool> {
        self.creator().cache_exists(&self.cache_name).await
    }

    /// Create the bound cache from its configured settings when it is missing.
    ///
    /// Returns `true` when the cache is usable. Fails with [`Error::UnknownCache`] only
    /// when the cache is missing and has no settings to create it from.
    pub async fn ensure_cache_exists(&self) -> Result<bool> {
        let creator = self.creator();
        if creator.cache_exists(&self.cache_name).await? {
            return Ok(true);
        }
        let settings = self.settings.cache(&self.cache_name)?;
        info!(cache = self.cache_name.as_str(), "cache missing, creating it");
        creator.create_cache(&self.cache_name, settings).await
    }
}
