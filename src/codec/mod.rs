//! 值编解码：JSON → Base64 → ProtoStream 信封，以及逆过程。
//!
//! # Envelope Codec
//!
//! Values travel to the server wrapped in a small JSON envelope that names the
//! registered Protobuf message type:
//!
//! ```json
//! { "_type": "cache.CacheEntry", "value": "eyJhIjoxfQ==" }
//! ```
//!
//! `value` is the Base64 encoding of the value's JSON text. The server converts the
//! envelope into its `application/x-protostream` storage format using the schema
//! registered by [`crate::client::SchemaManager::register_cache_entry_schema`].
//!
//! ```rust
//! use infinispan_rest_client::codec;
//! use serde_json::json;
//!
//! let envelope = codec::encode(&json!({"a": 1})).unwrap();
//! assert_eq!(envelope.type_name, codec::ENVELOPE_TYPE);
//! assert_eq!(codec::decode(&envelope).unwrap(), json!({"a": 1}));
//! ```

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fully qualified Protobuf message name carried in every envelope.
pub const ENVELOPE_TYPE: &str = "cache.CacheEntry";

/// Wire envelope exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "_type")]
    pub type_name: String,
    /// Base64 of the JSON-encoded value.
    pub value: String,
}

/// Serialize `value` to JSON, Base64 the bytes and wrap them in an [`Envelope`].
pub fn encode(value: &Value) -> Result<Envelope> {
    let json = serde_json::to_vec(value)?;
    Ok(Envelope {
        type_name: ENVELOPE_TYPE.to_string(),
        value: STANDARD.encode(json),
    })
}

/// Validate the discriminator, then Base64-decode and JSON-parse the payload.
pub fn decode(envelope: &Envelope) -> Result<Value> {
    if envelope.type_name != ENVELOPE_TYPE {
        return Err(Error::decode(format!(
            "unexpected envelope type '{}', expected '{}'",
            envelope.type_name, ENVELOPE_TYPE
        )));
    }
    let bytes = STANDARD
        .decode(envelope.value.as_bytes())
        .map_err(|e| Error::decode(format!("invalid base64 payload: {}", e)))?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| Error::decode(format!("payload is not valid UTF-8: {}", e)))?;
    serde_json::from_str(text).map_err(|e| Error::decode(format!("payload is not valid JSON: {}", e)))
}

/// Encode `value` and render the envelope as the JSON text sent in a request body.
pub fn encode_body(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&encode(value)?)?)
}

/// Parse a response body holding an envelope and decode the value inside it.
pub fn decode_body(body: &[u8]) -> Result<Value> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("envelope is not valid JSON: {}", e)))?;
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::decode("envelope is not a JSON object"))?;

    let type_name = obj
        .get("_type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode("envelope has no '_type' discriminator"))?;
    let value = obj
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode("envelope has no string 'value' field"))?;

    decode(&Envelope {
        type_name: type_name.to_string(),
        value: value.to_string(),
    })
}

/// Typed variant of [`encode`].
pub fn encode_as<T: Serialize + ?Sized>(value: &T) -> Result<Envelope> {
    encode(&serde_json::to_value(value)?)
}

/// Typed variant of [`decode`]. A payload that does not fit `T` is a decode error.
pub fn decode_as<T: DeserializeOwned>(envelope: &Envelope) -> Result<T> {
    let value = decode(envelope)?;
    serde_json::from_value(value)
        .map_err(|e| Error::decode(format!("payload does not match target type: {}", e)))
}
