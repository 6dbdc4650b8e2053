use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Extension;
use colored::Colorize as _;
use hyper::{Method, StatusCode, Uri, Version};

#[derive(Clone)]
pub struct RequestId(Arc<AtomicU64>);

impl RequestId {
    pub fn new() -> RequestId {
        RequestId(Arc::new(0.into()))
    }

    pub fn next(&mut self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct TracingInfo {
    pub connect_info: Option<ConnectInfo<SocketAddr>>,
    pub method: Method,
    pub version: Version,
    pub uri: Uri,
}

impl TracingInfo {
    /// Remote address, or `-` when unknown.
    pub fn peer(&self) -> String {
        self.connect_info
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| String::from("-"))
    }
}

pub struct ColoredStatus(pub StatusCode);

impl fmt::Display for ColoredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.0.to_string();

        match self.0.as_u16() {
            200..=299 => write!(f, "{}", status.green()),
            300..=399 => write!(f, "{}", status.blue()),
            400..=499 => write!(f, "{}", status.red()),
            _ => write!(f, "{}", status.yellow()),
        }
    }
}

pub async fn tracing_middleware(request: Request<Body>, next: Next) -> impl IntoResponse {
    let connect_info = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .copied();

    let tracing_info = TracingInfo {
        connect_info,
        method: request.method().clone(),
        version: request.version(),
        uri: request.uri().clone(),
    };

    let response = next.run(request).await;

    (Extension(tracing_info), response)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_id_is_shared() {
        let mut a = RequestId::new();
        let mut b = a.clone();

        assert_eq!(a.next(), 0);
        assert_eq!(b.next(), 1);
        assert_eq!(a.next(), 2);
    }

    #[test]
    fn test_peer_unknown() {
        let info = TracingInfo {
            connect_info: None,
            method: Method::GET,
            version: Version::HTTP_11,
            uri: Uri::from_static("/api/address"),
        };
        assert_eq!(info.peer(), "-");
    }
}
