use super::auth::answer_challenge;
use crate::config::ConnectionSettings;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use std::env;
use std::time::{Duration, Instant};
use tracing::debug;
use url::{Position, Url};
use uuid::Uuid;

/// Correlation header attached to every request.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
    pub request_id: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Convert a non-success response into the matching [`Error`].
    pub fn into_error(self) -> Error {
        let text = self.text();
        Error::from_status(self.status, text)
    }
}

/// reqwest-backed transport. Holds the pooled client and the credentials.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(connection: &ConnectionSettings) -> Result<Self> {
        Self::new_with_base_url(connection, None)
    }

    /// Create a transport; `base_url_override` replaces `{protocol}://{host}:{port}`.
    pub fn new_with_base_url(
        connection: &ConnectionSettings,
        base_url_override: Option<&str>,
    ) -> Result<Self> {
        let raw = match base_url_override {
            Some(base) => format!("{}/rest/v2", base.trim_end_matches('/')),
            None => connection.rest_url(),
        };
        let base_url = Url::parse(&raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid REST base URL: {}", e),
                ErrorContext::new()
                    .with_details(raw.clone())
                    .with_source("http_transport"),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::configuration_with_context(
                "REST base URL cannot carry path segments",
                ErrorContext::new().with_details(raw),
            ));
        }

        // Pool knobs stay env-only to keep the settings file small.
        let pool_max_idle = env::var("INFINISPAN_HTTP_POOL_MAX_IDLE_PER_HOST")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(16);
        let pool_idle_timeout = env::var("INFINISPAN_HTTP_POOL_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(90);

        let timeout = Duration::from_secs(connection.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(pool_max_idle)
            .pool_idle_timeout(Some(Duration::from_secs(pool_idle_timeout)))
            .danger_accept_invalid_certs(!connection.ssl_verify)
            .build()
            .map_err(|e| {
                Error::configuration_with_context(
                    format!("failed to create HTTP client: {}", e),
                    ErrorContext::new().with_source("http_transport"),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            username: connection.username.clone(),
            password: connection.password.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` extended by `segments`, each percent-encoded as one path segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::configuration("REST base URL cannot carry path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Same as [`HttpTransport::url`] with `?action=<action>` appended.
    pub fn action_url(&self, segments: &[&str], action: &str) -> Result<Url> {
        let mut url = self.url(segments)?;
        url.query_pairs_mut().append_pair("action", action);
        Ok(url)
    }

    /// Perform one HTTP exchange, answering an authentication challenge if one comes back.
    ///
    /// Any status is returned as-is; only transport failures are errors here.
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<(Bytes, &str)>,
    ) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let first = self
            .dispatch(&method, url, body.as_ref(), None, &request_id)
            .await?;

        let response = if first.status() == StatusCode::UNAUTHORIZED {
            match self.authorization_for(&first, &method, url)? {
                Some(authorization) => {
                    // Read the challenge body so its connection can return to the pool.
                    if let Err(e) = first.bytes().await {
                        debug!(
                            request_id = request_id.as_str(),
                            error = %e,
                            "failed to drain challenge response"
                        );
                    }
                    debug!(
                        request_id = request_id.as_str(),
                        "answering authentication challenge"
                    );
                    self.dispatch(&method, url, body.as_ref(), Some(&authorization), &request_id)
                        .await?
                }
                None => first,
            }
        } else {
            first
        };

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, url))?;

        debug!(
            request_id = request_id.as_str(),
            method = method.as_str(),
            url = url.as_str(),
            http_status = status,
            duration_ms = start.elapsed().as_millis() as u64,
            "infinispan request completed"
        );

        Ok(HttpResponse {
            status,
            body,
            request_id,
        })
    }

    fn authorization_for(
        &self,
        response: &reqwest::Response,
        method: &Method,
        url: &Url,
    ) -> Result<Option<String>> {
        let challenges: Vec<&str> = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        // Prefer Digest when the server offers several schemes.
        let challenge = challenges
            .iter()
            .find(|c| c.trim_start().to_ascii_lowercase().starts_with("digest"))
            .or_else(|| challenges.first());

        match challenge {
            Some(c) => answer_challenge(
                c,
                &self.username,
                &self.password,
                method.as_str(),
                &url[Position::BeforePath..],
            ),
            None => Ok(None),
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&(Bytes, &str)>,
        authorization: Option<&str>,
        request_id: &str,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, request_id);

        if let Some((bytes, content_type)) = body {
            request = request
                .header(CONTENT_TYPE, *content_type)
                .body(bytes.clone());
        }
        if let Some(auth) = authorization {
            request = request.header(AUTHORIZATION, auth);
        }

        request.send().await.map_err(|e| map_reqwest_error(e, url))
    }
}

fn map_reqwest_error(e: reqwest::Error, url: &Url) -> Error {
    let context = ErrorContext::new()
        .with_details(url.to_string())
        .with_source("http_transport");
    if e.is_timeout() {
        Error::timeout_with_context(e.to_string(), context)
    } else if e.is_builder() {
        Error::configuration_with_context(e.to_string(), context)
    } else {
        Error::connection_with_context(e.to_string(), context)
    }
}
