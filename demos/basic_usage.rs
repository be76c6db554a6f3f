//! Basic usage example
//!
//! Stores, reads and deletes a value in a running Infinispan server.
//!
//! Connection settings come from `INFINISPAN_HOST`, `INFINISPAN_PORT`,
//! `INFINISPAN_USERNAME`, `INFINISPAN_PASSWORD` and `INFINISPAN_CACHE_NAME`,
//! optionally layered over a settings file passed as the first argument.
//!
//! Usage:
//!   cargo run --example basic_usage -- infinispan.json

use infinispan_rest_client::{CacheClientBuilder, RetryConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    name: String,
    languages: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut builder = CacheClientBuilder::new().retry_config(
        RetryConfig::new()
            .with_max_retries(3)
            .with_initial_delay(Duration::from_millis(200))
            .with_backoff_multiplier(2.0),
    );
    if let Some(path) = std::env::args().nth(1) {
        builder = builder.config_path(path);
    }
    let client = builder.build()?;
    println!("Using cache '{}'", client.cache_name());

    client
        .put("greeting", &json!({"text": "hello", "count": 1}))
        .await?;
    println!("greeting = {:?}", client.get("greeting").await?);

    let profile = Profile {
        name: "Ada".to_string(),
        languages: vec!["en".to_string(), "fr".to_string()],
    };
    client.put_as("profile:ada", &profile).await?;
    let back: Option<Profile> = client.get_as("profile:ada").await?;
    println!("profile = {:?}", back);

    println!("keys = {:?}", client.get_all_keys().await?);
    println!("exists(greeting) = {}", client.exists("greeting").await?);

    client.delete("greeting").await?;
    println!("after delete: {:?}", client.get("greeting").await?);

    let stats = client.get_cache_stats().await?;
    if let Some(entries) = stats.get("current_number_of_entries") {
        println!("entries = {}", entries);
    }
    Ok(())
}
