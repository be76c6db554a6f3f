//! Create every enabled cache from a settings file
//!
//! Also registers the `cache_entry.proto` schema used by the envelope format.
//!
//! Usage:
//!   cargo run --example create_caches -- infinispan.yaml

use anyhow::Context;
use infinispan_rest_client::{CacheCreator, RetryConfig, SchemaManager, Settings};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: create_caches <settings file>")?;
    let settings = Settings::load(Some(&path))?;

    let schemas = SchemaManager::new(&settings.connection, RetryConfig::default())?;
    if schemas.register_cache_entry_schema().await? {
        println!("registered cache_entry.proto");
    }

    let creator = CacheCreator::new(&settings.connection, RetryConfig::default())?;
    for (name, cache) in &settings.caches {
        if !cache.enabled {
            println!("{name}: disabled, skipped");
            continue;
        }
        let ready = creator.create_cache(name, cache).await?;
        println!(
            "{name}: {}",
            if ready { "ready" } else { "exists with an incompatible definition" }
        );
    }
    Ok(())
}
