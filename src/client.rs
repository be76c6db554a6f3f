//! Cache client for the Infinispan REST API.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod creator;
pub mod definition;
mod execution;
pub mod schema;

pub use builder::CacheClientBuilder;
pub use core::CacheClient;
pub use creator::CacheCreator;
pub use definition::{build_definition, is_compatible};
pub use schema::{SchemaManager, CACHE_ENTRY_SCHEMA, CACHE_ENTRY_SCHEMA_NAME};
