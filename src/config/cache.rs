//! Per-cache settings as they appear under the `caches` key of the configuration file.
//!
//! Every field is optional in the file; missing fields take the defaults below.

use serde::{Deserialize, Serialize};

/// Default media type for both keys and values.
pub const PROTOSTREAM_MEDIA_TYPE: &str = "application/x-protostream";

/// Settings for a single named cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub description: String,
    /// Maximum memory footprint, e.g. "50MB".
    pub memory_size: String,
    /// Entry lifespan in hours.
    pub ttl_hours: u64,
    pub l1_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l1_expiration_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l1_expiration_hours: Option<u64>,
    pub locking: LockingSettings,
    pub transaction: TransactionSettings,
    pub encoding: EncodingSettings,
    pub persistence: PersistenceSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            description: String::new(),
            memory_size: "50MB".to_string(),
            ttl_hours: 2,
            l1_size: "5MB".to_string(),
            l1_expiration_minutes: None,
            l1_expiration_hours: None,
            locking: LockingSettings::default(),
            transaction: TransactionSettings::default(),
            encoding: EncodingSettings::default(),
            persistence: PersistenceSettings::default(),
        }
    }
}

const DEFAULT_L1_EXPIRATION_MS: u64 = 30 * 60 * 1000;

impl CacheSettings {
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_hours.saturating_mul(60 * 60 * 1000)
    }

    /// L1 lifespan in milliseconds: minutes take precedence over hours, 30 minutes otherwise.
    pub fn l1_expiration_ms(&self) -> u64 {
        if let Some(minutes) = self.l1_expiration_minutes {
            return minutes.saturating_mul(60 * 1000);
        }
        if let Some(hours) = self.l1_expiration_hours {
            return hours.saturating_mul(60 * 60 * 1000);
        }
        DEFAULT_L1_EXPIRATION_MS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationLevel {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockingSettings {
    pub isolation: IsolationLevel,
    /// Lock acquisition timeout in milliseconds.
    pub acquire_timeout: u64,
    pub concurrency_level: u32,
    pub striping: bool,
}

impl Default for LockingSettings {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::ReadCommitted,
            acquire_timeout: 30_000,
            concurrency_level: 1000,
            striping: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionMode {
    None,
    BatchMode,
    NonXa,
    NonDurableXa,
    FullXa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockingMode {
    Optimistic,
    Pessimistic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSettings {
    pub mode: TransactionMode,
    pub locking: LockingMode,
    pub auto_commit: bool,
    pub recovery_enabled: bool,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            mode: TransactionMode::None,
            locking: LockingMode::Optimistic,
            auto_commit: true,
            recovery_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaTypeSettings {
    pub media_type: String,
}

impl Default for MediaTypeSettings {
    fn default() -> Self {
        Self {
            media_type: PROTOSTREAM_MEDIA_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    pub key: MediaTypeSettings,
    pub value: MediaTypeSettings,
}

/// Only `file-store` is understood when building cache definitions.
pub const FILE_STORE: &str = "file-store";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub store_type: String,
    /// Relative to the server's global persistent location.
    pub path: String,
    pub passivation: bool,
    pub shared: bool,
    pub write_behind: WriteBehindSettings,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            store_type: FILE_STORE.to_string(),
            path: "caches".to_string(),
            passivation: false,
            shared: false,
            write_behind: WriteBehindSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteBehindSettings {
    pub enabled: bool,
    pub modification_queue_size: u32,
    /// Server-side only: the store swallows write failures instead of logging them.
    pub fail_silently: bool,
}

impl Default for WriteBehindSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            modification_queue_size: 2048,
            fail_silently: false,
        }
    }
}
