//! Environment-variable overrides for connection settings.

/// Host of the Infinispan server.
pub const ENV_HOST: &str = "INFINISPAN_HOST";
/// REST port of the Infinispan server.
pub const ENV_PORT: &str = "INFINISPAN_PORT";
pub const ENV_USERNAME: &str = "INFINISPAN_USERNAME";
pub const ENV_PASSWORD: &str = "INFINISPAN_PASSWORD";
/// Cache the client binds to when the builder does not name one.
pub const ENV_CACHE_NAME: &str = "INFINISPAN_CACHE_NAME";
/// `http` or `https`.
pub const ENV_PROTOCOL: &str = "INFINISPAN_PROTOCOL";
pub const ENV_SSL_VERIFY: &str = "INFINISPAN_SSL_VERIFY";
/// Per-attempt HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "INFINISPAN_HTTP_TIMEOUT_SECS";

/// Raw override values, parsed when they are applied so errors can name the variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub host: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cache_name: Option<String>,
    pub protocol: Option<String>,
    pub ssl_verify: Option<String>,
    pub timeout_secs: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary lookup (handy for tests and embedding).
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            host: get(ENV_HOST),
            port: get(ENV_PORT),
            username: get(ENV_USERNAME),
            password: get(ENV_PASSWORD),
            cache_name: get(ENV_CACHE_NAME),
            protocol: get(ENV_PROTOCOL),
            ssl_verify: get(ENV_SSL_VERIFY),
            timeout_secs: get(ENV_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
