use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::error::Error;
use crate::api::Context;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carries the configured API key.
///
/// Handlers that take this extractor are refused with `401` when no key is
/// configured on the server, or when the request's `x-api-key` header does
/// not match it. It is checked before the request body is read.
#[derive(Debug)]
pub struct Authorized;

#[async_trait]
impl FromRequestParts<Context> for Authorized {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, ctx: &Context) -> Result<Self, Self::Rejection> {
        let Some(expected) = ctx.config().api_key.as_deref() else {
            tracing::warn!(
                "{} environment variable is not set",
                miniapp::config::env::API_KEY
            );
            return Err(Error::Unauthorized);
        };

        match parts.headers.get(API_KEY_HEADER) {
            Some(key) if keys_match(key.as_bytes(), expected.as_bytes()) => Ok(Authorized),
            _ => Err(Error::Unauthorized),
        }
    }
}

/// Compare two keys in time that only depends on their length.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
