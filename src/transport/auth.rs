//! Answers to `WWW-Authenticate` challenges.
//!
//! The server is contacted without credentials first; a 401 carries the challenge that
//! tells us which scheme (and, for Digest, which nonce) to answer with.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use digest_auth::{AuthContext, HttpMethod};

/// Build the `Authorization` header value for a challenge, or `None` for unknown schemes.
pub(crate) fn answer_challenge(
    challenge: &str,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
) -> Result<Option<String>> {
    let scheme = challenge
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match scheme.as_str() {
        "digest" => {
            let mut prompt = digest_auth::parse(challenge).map_err(|e| Error::Authentication {
                status: 401,
                message: format!("malformed digest challenge: {}", e),
            })?;
            let mut context = AuthContext::new(username, password, uri);
            context.method = HttpMethod::from(method);
            let answer = prompt.respond(&context).map_err(|e| Error::Authentication {
                status: 401,
                message: format!("cannot answer digest challenge: {}", e),
            })?;
            Ok(Some(answer.to_header_string()))
        }
        "basic" => {
            let token = STANDARD.encode(format!("{}:{}", username, password));
            Ok(Some(format!("Basic {}", token)))
        }
        _ => Ok(None),
    }
}
