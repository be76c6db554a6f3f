//! 配置模型：连接参数与按缓存名划分的缓存设置，文件加载后由环境变量覆盖。
//!
//! # Configuration Model
//!
//! Settings come from an optional JSON (or YAML) file and are then overridden by
//! `INFINISPAN_*` environment variables. The resolved [`Settings`] value is immutable
//! and handed to the client at construction time.
//!
//! ```json
//! {
//!   "host": "localhost",
//!   "port": 11222,
//!   "username": "admin",
//!   "password": "admin",
//!   "caches": {
//!     "sessions": { "enabled": true, "memory_size": "100MB", "ttl_hours": 4 }
//!   }
//! }
//! ```

mod cache;
mod env;

pub use cache::{
    CacheSettings, EncodingSettings, IsolationLevel, LockingMode, LockingSettings,
    MediaTypeSettings, PersistenceSettings, TransactionMode, TransactionSettings,
    WriteBehindSettings, FILE_STORE, PROTOSTREAM_MEDIA_TYPE,
};
pub use env::{
    EnvOverrides, ENV_CACHE_NAME, ENV_HOST, ENV_HTTP_TIMEOUT_SECS, ENV_PASSWORD, ENV_PORT,
    ENV_PROTOCOL, ENV_SSL_VERIFY, ENV_USERNAME,
};

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 11222;
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
pub const DEFAULT_CACHE_NAME: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// URL scheme used to reach the REST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// `rest` is accepted for files written for the older hotrod/rest selector.
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

// Files and `INFINISPAN_PROTOCOL` accept the same spellings.
impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "rest" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(Error::configuration(format!(
                "unsupported protocol '{}', expected http or https",
                other
            ))),
        }
    }
}

/// Where and how to reach the server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub protocol: Protocol,
    pub ssl_verify: bool,
    /// Per-attempt HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            protocol: Protocol::Http,
            ssl_verify: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("protocol", &self.protocol)
            .field("ssl_verify", &self.ssl_verify)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionSettings {
    /// Base URL of the REST v2 API, e.g. `http://localhost:11222/rest/v2`.
    pub fn rest_url(&self) -> String {
        format!("{}://{}:{}/rest/v2", self.protocol, self.host, self.port)
    }
}

/// On-disk layout; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    protocol: Option<Protocol>,
    ssl_verify: Option<bool>,
    timeout_secs: Option<u64>,
    cache_name: Option<String>,
    caches: BTreeMap<String, CacheSettings>,
}

/// Fully resolved client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub connection: ConnectionSettings,
    /// Cache a client binds to when none is given explicitly.
    pub cache_name: String,
    pub caches: BTreeMap<String, CacheSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            caches: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_overrides(path, &EnvOverrides::from_env())
    }

    /// Same as [`Settings::load`] with explicitly supplied overrides.
    pub fn load_with_overrides(path: Option<&Path>, overrides: &EnvOverrides) -> Result<Self> {
        let file = match path {
            Some(p) => read_file(p)?,
            None => SettingsFile::default(),
        };
        let settings = resolve(file, overrides)?;
        tracing::debug!(
            host = settings.connection.host.as_str(),
            port = settings.connection.port,
            caches = settings.caches.len(),
            "resolved infinispan settings"
        );
        Ok(settings)
    }

    /// Parse settings from an in-memory JSON document, without environment overrides.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: SettingsFile = serde_json::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid JSON settings: {}", e),
                ErrorContext::new().with_source("settings_loader"),
            )
        })?;
        resolve(file, &EnvOverrides::default())
    }

    /// Settings for `name`, or [`Error::UnknownCache`].
    pub fn cache(&self, name: &str) -> Result<&CacheSettings> {
        self.caches.get(name).ok_or_else(|| Error::UnknownCache {
            name: name.to_string(),
        })
    }

    pub fn cache_names(&self) -> Vec<&str> {
        self.caches.keys().map(String::as_str).collect()
    }

    pub fn is_cache_enabled(&self, name: &str) -> bool {
        self.caches.get(name).map(|c| c.enabled).unwrap_or(false)
    }

    /// Add or replace a cache definition.
    pub fn with_cache(mut self, name: impl Into<String>, settings: CacheSettings) -> Self {
        self.caches.insert(name.into(), settings);
        self
    }
}

fn read_file(path: &Path) -> Result<SettingsFile> {
    let ctx = || {
        ErrorContext::new()
            .with_details(path.display().to_string())
            .with_source("settings_loader")
    };
    if !path.exists() {
        return Err(Error::configuration_with_context(
            "settings file not found",
            ctx(),
        ));
    }
    let text = std::fs::read_to_string(path)?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| {
            Error::configuration_with_context(format!("invalid YAML settings: {}", e), ctx())
        })
    } else {
        serde_json::from_str(&text).map_err(|e| {
            Error::configuration_with_context(format!("invalid JSON settings: {}", e), ctx())
        })
    }
}

fn invalid_override(name: &str, raw: &str) -> Error {
    Error::configuration_with_context(
        "invalid environment override",
        ErrorContext::new()
            .with_field_path(name)
            .with_details(format!("value: {}", raw))
            .with_source("settings_loader"),
    )
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid_override(name, raw))
}

fn resolve(file: SettingsFile, env: &EnvOverrides) -> Result<Settings> {
    let defaults = ConnectionSettings::default();

    let port = match env.port.as_deref() {
        Some(raw) => parse_env::<u16>(ENV_PORT, raw)?,
        None => file.port.unwrap_or(defaults.port),
    };
    let protocol = match env.protocol.as_deref() {
        Some(raw) => parse_env::<Protocol>(ENV_PROTOCOL, raw)?,
        None => file.protocol.unwrap_or(defaults.protocol),
    };
    let ssl_verify = match env.ssl_verify.as_deref() {
        Some(raw) => {
            env::parse_bool(raw).ok_or_else(|| invalid_override(ENV_SSL_VERIFY, raw))?
        }
        None => file.ssl_verify.unwrap_or(defaults.ssl_verify),
    };
    let timeout_secs = match env.timeout_secs.as_deref() {
        Some(raw) => parse_env::<u64>(ENV_HTTP_TIMEOUT_SECS, raw)?,
        None => file.timeout_secs.unwrap_or(defaults.timeout_secs),
    };
    if timeout_secs == 0 {
        return Err(Error::configuration_with_context(
            "timeout must be at least one second",
            ErrorContext::new().with_field_path("timeout_secs"),
        ));
    }

    let connection = ConnectionSettings {
        host: env.host.clone().or(file.host).unwrap_or(defaults.host),
        port,
        username: env
            .username
            .clone()
            .or(file.username)
            .unwrap_or(defaults.username),
        password: env
            .password
            .clone()
            .or(file.password)
            .unwrap_or(defaults.password),
        protocol,
        ssl_verify,
        timeout_secs,
    };

    Ok(Settings {
        connection,
        cache_name: env
            .cache_name
            .clone()
            .or(file.cache_name)
            .unwrap_or_else(|| DEFAULT_CACHE_NAME.to_string()),
        caches: file.caches,
    })
}
