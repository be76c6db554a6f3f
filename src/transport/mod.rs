//! HTTP transport for the Infinispan REST API.

mod auth;
mod http;

pub use http::{HttpResponse, HttpTransport};
