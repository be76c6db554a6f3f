//! Translation of [`CacheSettings`] into the server's cache definition document.

use crate::config::{CacheSettings, PersistenceSettings, FILE_STORE};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Top-level element of every definition this crate creates.
pub const CACHE_MODE: &str = "distributed-cache";

/// Build the `distributed-cache` definition posted when a cache is created.
pub fn build_definition(settings: &CacheSettings) -> Value {
    let l1_ms = settings.l1_expiration_ms();

    let mut transaction = json!({
        "mode": settings.transaction.mode,
        "auto-commit": settings.transaction.auto_commit,
        "locking": settings.transaction.locking,
    });
    if settings.transaction.recovery_enabled {
        transaction["recovery"] = json!({ "enabled": true });
    }

    let mut cache = json!({
        "mode": "SYNC",
        "owners": 1,
        "statistics": true,
        "l1-lifespan": l1_ms,
        "l1-cleanup-interval": l1_ms,
        "locking": {
            "isolation": settings.locking.isolation,
            "acquire-timeout": settings.locking.acquire_timeout,
            "concurrency-level": settings.locking.concurrency_level,
            "striping": settings.locking.striping,
        },
        "transaction": transaction,
        "memory": {
            "max-size": settings.memory_size,
            "when-full": "REMOVE",
            "storage": "HEAP",
        },
        "expiration": {
            "lifespan": settings.ttl_ms(),
        },
        "encoding": {
            "key": { "media-type": settings.encoding.key.media_type },
            "value": { "media-type": settings.encoding.value.media_type },
        },
    });

    if let Some(persistence) = build_persistence(&settings.persistence) {
        cache["persistence"] = persistence;
    }

    let mut root = Map::new();
    root.insert(CACHE_MODE.to_string(), cache);
    Value::Object(root)
}

fn build_persistence(p: &PersistenceSettings) -> Option<Value> {
    if !p.enabled {
        return None;
    }
    if p.store_type != FILE_STORE {
        warn!(
            store_type = p.store_type.as_str(),
            "unsupported persistence type, only file-store is supported; skipping persistence"
        );
        return None;
    }

    let mut file_store = json!({
        "shared": p.shared,
        "data": { "path": format!("{}/data", p.path) },
        "index": { "path": format!("{}/index", p.path) },
    });
    if p.write_behind.enabled {
        file_store["write-behind"] = json!({
            "modification-queue-size": p.write_behind.modification_queue_size,
            "fail-silently": p.write_behind.fail_silently,
        });
    }

    Some(json!({
        "passivation": p.passivation,
        "file-store": file_store,
    }))
}

/// Top-level elements the server uses for a cache definition.
const CACHE_MODES: [&str; 5] = [
    "distributed-cache",
    "replicated-cache",
    "local-cache",
    "invalidation-cache",
    "scattered-cache",
];

fn find_mode(obj: &Map<String, Value>) -> Option<(&str, &Value)> {
    obj.iter()
        .find(|(k, _)| CACHE_MODES.contains(&k.as_str()))
        .map(|(mode, body)| (mode.as_str(), body))
}

/// Locate the cache mode element, also when the server wraps it in the cache name.
fn mode_section(definition: &Value) -> Option<(&str, &Value)> {
    let obj = definition.as_object()?;
    if obj.len() == 1 {
        if let Some(found) = obj
            .values()
            .next()
            .and_then(Value::as_object)
            .and_then(find_mode)
        {
            return Some(found);
        }
    }
    find_mode(obj)
}

fn media_type<'a>(section: &'a Value, which: &str) -> Option<&'a str> {
    section
        .get("encoding")?
        .get(which)?
        .get("media-type")?
        .as_str()
}

/// Whether an existing definition can serve a client configured with `desired`.
///
/// The cache mode must match; key and value media types must match where the
/// server reports them.
pub fn is_compatible(existing: &Value, desired: &Value) -> bool {
    let (Some((mode_a, a)), Some((mode_b, b))) = (mode_section(existing), mode_section(desired))
    else {
        return false;
    };
    if mode_a != mode_b {
        return false;
    }
    ["key", "value"].iter().all(|which| {
        match (media_type(a, which), media_type(b, which)) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        }
    })
}
