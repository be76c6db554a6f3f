//! # infinispan-rest-client
//!
//! Infinispan REST 缓存客户端：信封编解码、配置加载、指数退避重试与缓存生命周期管理。
//!
//! Async client for the Infinispan REST API (v2). Values are wrapped in a
//! `cache.CacheEntry` envelope, every call runs under an exponential-backoff retry
//! policy, and caches can be created on demand from configured settings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use infinispan_rest_client::CacheClientBuilder;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> infinispan_rest_client::Result<()> {
//!     let client = CacheClientBuilder::new()
//!         .config_path("infinispan.json")
//!         .cache_name("sessions")
//!         .build()?;
//!
//!     client.put("user:42", &json!({"name": "Ada"})).await?;
//!     let value = client.get("user:42").await?;
//!     assert_eq!(value, Some(json!({"name": "Ada"})));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Cache client, cache creator and schema manager |
//! | [`codec`] | Envelope encoding and decoding |
//! | [`config`] | Settings file and environment overrides |
//! | [`retry`] | Exponential-backoff retry policy |
//! | [`transport`] | reqwest transport with Digest/Basic authentication |

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;

pub use client::{CacheClient, CacheClientBuilder, CacheCreator, SchemaManager};
pub use codec::Envelope;
pub use config::{CacheSettings, ConnectionSettings, Settings};
pub use error::{Error, ErrorContext, ErrorKind};
pub use retry::{RetryConfig, RetryPolicy};

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, Error>;
