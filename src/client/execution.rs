//! 请求执行：在重试策略下执行单个 REST 调用并映射状态码。
//!
//! Request execution shared by the cache client, the cache creator and the schema manager.

use crate::retry::RetryPolicy;
use crate::transport::{HttpResponse, HttpTransport};
use crate::Result;
use bytes::Bytes;
use reqwest::Method;
use std::sync::Arc;
use url::Url;

#[derive(Clone)]
pub(crate) struct RequestExecutor {
    transport: Arc<HttpTransport>,
    retry: Arc<RetryPolicy>,
}

impl RequestExecutor {
    pub(crate) fn new(transport: Arc<HttpTransport>, retry: Arc<RetryPolicy>) -> Self {
        Self { transport, retry }
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Run one REST call under the retry policy.
    ///
    /// Success and 404 responses are returned to the caller; every other status is
    /// mapped to an error, which the policy retries when it is transient.
    pub(crate) async fn call(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<(Bytes, String)>,
    ) -> Result<HttpResponse> {
        let (transport, method, url, body) = (&*self.transport, &method, &url, &body);
        self.retry
            .execute(operation, move || async move {
                let payload = body.as_ref().map(|(b, ct)| (b.clone(), ct.as_str()));
                let response = transport.send(method.clone(), url, payload).await?;
                if response.is_success() || response.is_not_found() {
                    Ok(response)
                } else {
                    Err(response.into_error())
                }
            })
            .await
    }
}

/// Treat anything but 2xx as an error, 404 included.
pub(crate) fn expect_success(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(response.into_error())
    }
}
