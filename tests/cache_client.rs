//! Cache client operations against a mock Infinispan server.

mod common;

use common::{fast_retry, key_path, MockServerFixture, CACHE};
use infinispan_rest_client::codec;
use infinispan_rest_client::{CacheClientBuilder, ErrorKind, Settings};
use mockito::Matcher;
use serde::{Deserialize, Serialize};
use serde_json::json;

fn envelope_json(value: &serde_json::Value) -> serde_json::Value {
    serde_json::to_value(codec::encode(value).unwrap()).unwrap()
}

#[tokio::test]
async fn test_put_sends_envelope() {
    let fixture = MockServerFixture::new().await;
    let value = json!({"name": "Ada", "roles": ["admin"], "age": 36});

    let _head = fixture.mock_cache_present().await;
    let put = {
        let mut server = fixture.server.lock().await;
        server
            .mock("PUT", key_path("user42").as_str())
            .match_header("content-type", "application/x-protostream")
            .match_body(Matcher::Json(envelope_json(&value)))
            .with_status(204)
            .expect(1)
            .create_async()
            .await
    };

    let client = fixture.client(fast_retry(0));
    client.put("user42", &value).await.unwrap();
    put.assert_async().await;
}

#[tokio::test]
async fn test_get_decodes_envelope() {
    let fixture = MockServerFixture::new().await;
    let value = json!({"name": "Ada", "nested": {"x": [1, 2, 3]}});
    let body = envelope_json(&value).to_string();
    let _get = fixture.mock("GET", &key_path("user42"), 200, &body).await;

    let client = fixture.client(fast_retry(0));
    assert_eq!(client.get("user42").await.unwrap(), Some(value));
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let fixture = MockServerFixture::new().await;
    let _get = fixture.mock("GET", &key_path("ghost"), 404, "").await;

    let client = fixture.client(fast_retry(0));
    assert_eq!(client.get("ghost").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_malformed_body_is_decode_error() {
    let fixture = MockServerFixture::new().await;
    let _get = fixture
        .mock("GET", &key_path("broken"), 200, r#"{"_type":"cache.CacheEntry","value":"%%%"}"#)
        .await;

    let client = fixture.client(fast_retry(3));
    let err = client.get("broken").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    ttl: u32,
}

#[tokio::test]
async fn test_typed_get_and_raw_get() {
    let fixture = MockServerFixture::new().await;
    let session = Session {
        user: "ada".to_string(),
        ttl: 60,
    };
    let body = serde_json::to_string(&codec::encode_as(&session).unwrap()).unwrap();
    let _get = fixture.mock("GET", &key_path("s1"), 200, &body).await;

    let client = fixture.client(fast_retry(0));
    let typed: Option<Session> = client.get_as("s1").await.unwrap();
    assert_eq!(typed, Some(session));

    let raw = client.get_raw("s1").await.unwrap().unwrap();
    assert!(raw.contains("cache.CacheEntry"));
}

#[tokio::test]
async fn test_exists() {
    let fixture = MockServerFixture::new().await;
    let _present = fixture.mock("HEAD", &key_path("here"), 200, "").await;
    let _absent = fixture.mock("HEAD", &key_path("gone"), 404, "").await;

    let client = fixture.client(fast_retry(0));
    assert!(client.exists("here").await.unwrap());
    assert!(!client.exists("gone").await.unwrap());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let fixture = MockServerFixture::new().await;
    let _present = fixture.mock("DELETE", &key_path("here"), 204, "").await;
    let _absent = fixture.mock("DELETE", &key_path("gone"), 404, "").await;

    let client = fixture.client(fast_retry(0));
    client.delete("here").await.unwrap();
    client.delete("gone").await.unwrap();
}

#[tokio::test]
async fn test_clear_keys_and_stats() {
    let fixture = MockServerFixture::new().await;
    let clear = fixture.mock_action("POST", "clear", 204, "").await;
    let _keys = fixture
        .mock_action("GET", "keys", 200, r#"["a","b","c"]"#)
        .await;
    let _stats = fixture
        .mock_action(
            "GET",
            "stats",
            200,
            r#"{"current_number_of_entries":3,"hits":10,"misses":2}"#,
        )
        .await;

    let client = fixture.client(fast_retry(0));
    client.clear_cache().await.unwrap();
    clear.assert_async().await;

    assert_eq!(client.get_all_keys().await.unwrap(), vec!["a", "b", "c"]);

    let stats = client.get_cache_stats().await.unwrap();
    assert_eq!(stats["current_number_of_entries"], 3);
    assert_eq!(stats["hits"], 10);
}

#[tokio::test]
async fn test_keys_on_missing_cache_is_remote_error() {
    let fixture = MockServerFixture::new().await;
    let _keys = fixture.mock_action("GET", "keys", 404, "").await;

    let client = fixture.client(fast_retry(0));
    let err = client.get_all_keys().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_authentication_failure_not_retried() {
    let fixture = MockServerFixture::new().await;
    let get = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", key_path("k").as_str())
            .with_status(401)
            .expect(1)
            .create_async()
            .await
    };

    let client = fixture.client(fast_retry(3));
    let err = client.get("k").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    get.assert_async().await;
}

#[tokio::test]
async fn test_server_busy_retried_until_exhausted() {
    let fixture = MockServerFixture::new().await;
    let get = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", key_path("k").as_str())
            .with_status(503)
            .with_body("busy")
            .expect(3)
            .create_async()
            .await
    };

    let client = fixture.client(fast_retry(2));
    let err = client.get("k").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RetryExhausted);
    assert_eq!(err.status(), Some(503));
    match err {
        infinispan_rest_client::Error::RetryExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
    get.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let client = CacheClientBuilder::new()
        .settings(Settings::default())
        .cache_name(CACHE)
        .retry_config(fast_retry(2))
        .base_url_override("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = client.exists("k").await.unwrap_err();
    match err {
        infinispan_rest_client::Error::RetryExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert_eq!(source.kind(), ErrorKind::Connection);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unresponsive_server_times_out_and_retries() {
    // Accepts connections but never writes a response.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept_loop = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut settings = Settings::default();
    settings.connection.timeout_secs = 1;
    let client = CacheClientBuilder::new()
        .settings(settings)
        .cache_name(CACHE)
        .retry_config(fast_retry(1))
        .base_url_override(format!("http://{}", addr))
        .build()
        .unwrap();

    let err = client.exists("k").await.unwrap_err();
    accept_loop.abort();
    match err {
        infinispan_rest_client::Error::RetryExhausted { attempts, source } => {
            assert_eq!(attempts, 2);
            assert_eq!(source.kind(), ErrorKind::Timeout);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_digest_challenge_answered() {
    let fixture = MockServerFixture::new().await;
    let body = envelope_json(&json!("secret value")).to_string();
    let (challenge, answered) = {
        let mut server = fixture.server.lock().await;
        let challenge = server
            .mock("GET", key_path("k").as_str())
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_body("<html><body>ISPN000287: Unauthorized access</body></html>")
            .with_header(
                "www-authenticate",
                r#"Digest realm="default", nonce="bm9uY2U=", opaque="00", algorithm=MD5, qop="auth""#,
            )
            .expect(1)
            .create_async()
            .await;
        let answered = server
            .mock("GET", key_path("k").as_str())
            .match_header(
                "authorization",
                Matcher::Regex(r#"^Digest .*username="admin""#.to_string()),
            )
            .with_status(200)
            .with_body(&body)
            .expect(1)
            .create_async()
            .await;
        (challenge, answered)
    };

    let client = fixture.client(fast_retry(0));
    assert_eq!(client.get("k").await.unwrap(), Some(json!("secret value")));
    challenge.assert_async().await;
    answered.assert_async().await;
}

#[tokio::test]
async fn test_put_fails_for_unconfigured_missing_cache() {
    let fixture = MockServerFixture::new().await;
    let _head = fixture.mock("HEAD", "/rest/v2/caches/unknown", 404, "").await;

    let client = fixture.client(fast_retry(0)).with_cache("unknown");
    let err = client.put("k", &json!(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownCache);
}
