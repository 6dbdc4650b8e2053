#![allow(clippy::type_complexity)]
pub mod error;

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::{Request, Response};
use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use miniapp::storage::memory::MemoryStore;
use miniapp::{Config, Store};

use crate::error::Error;
use tracing_extra::{tracing_middleware, ColoredStatus, RequestId, TracingInfo};

mod api;
mod tracing_extra;
mod well_known;

/// Where the address list is kept.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The remote blob store.
    #[default]
    Blob,
    /// Process memory. Lost on restart.
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => f.write_str("blob"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub listen: SocketAddr,
    pub backend: Backend,
    /// Keep the default address in an otherwise empty list.
    pub default_address: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            backend: Backend::default(),
            default_address: true,
        }
    }
}

/// Run the Server.
pub async fn run(options: Options) -> anyhow::Result<()> {
    let listen = options.listen;
    let ctx = context(&options)?;
    let request_id = RequestId::new();

    let app = router(ctx)
        .layer(middleware::from_fn(tracing_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |_request: &Request<Body>| {
                    tracing::info_span!("request", id = %request_id.clone().next())
                })
                .on_response(
                    |response: &Response<Body>, latency: Duration, _span: &Span| {
                        if let Some(info) = response.extensions().get::<TracingInfo>() {
                            tracing::info!(
                                "{} \"{} {} {:?}\" {} {:?} {}",
                                info.peer(),
                                info.method,
                                info.uri,
                                info.version,
                                ColoredStatus(response.status()),
                                latency,
                                response
                                    .body()
                                    .size_hint()
                                    .exact()
                                    .map(|n| n.to_string())
                                    .unwrap_or("0".to_string()),
                            );
                        } else {
                            tracing::info!("Processed");
                        }
                    },
                ),
        )
        .into_make_service_with_connect_info::<SocketAddr>();

    let listener = TcpListener::bind(listen).await?;

    tracing::info!("listening on http://{}", listen);

    axum::serve(listener, app).await.map_err(anyhow::Error::from)
}

/// Build the request context from the environment.
fn context(options: &Options) -> Result<api::Context, Error> {
    let mut config = Config::from_env()?;
    if !options.default_address {
        config = config.without_default_address();
    }
    let store: Arc<dyn Store> = match options.backend {
        Backend::Blob => Arc::new(config.blob_store()?),
        Backend::Memory => Arc::new(MemoryStore::default()),
    };

    tracing::info!("deployment {}", config.deployment_id());
    tracing::info!(
        "storing addresses in {} object '{}'",
        options.backend,
        config.storage_key()
    );
    if config.api_key.is_none() {
        tracing::warn!(
            "{} is not set, address updates will be refused",
            miniapp::config::env::API_KEY
        );
    }

    api::Context::new(config, store)
}

/// Create a router consisting of other sub-routers.
fn router(ctx: api::Context) -> Router {
    let api_router = api::router(ctx.clone());
    let well_known_router = well_known::router(ctx);

    Router::new()
        .merge(well_known_router)
        .nest("/api", api_router)
        .layer(CatchPanicLayer::custom(api::error::panic_response))
}

pub mod logger {
    use tracing_subscriber::util::{SubscriberInitExt as _, TryInitError};

    /// Install the global subscriber. Records emitted through `log` are
    /// forwarded to it.
    pub fn init() -> Result<(), TryInitError> {
        subscriber().try_init()
    }

    #[cfg(feature = "logfmt")]
    pub fn subscriber() -> impl tracing::Subscriber + Send + Sync {
        use tracing_subscriber::layer::SubscriberExt as _;
        use tracing_subscriber::EnvFilter;

        tracing_subscriber::Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(tracing_logfmt::layer())
    }

    #[cfg(not(feature = "logfmt"))]
    pub fn subscriber() -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::FmtSubscriber::builder()
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }
}

#[cfg(test)]
mod routes {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    use crate::test::{self, get};

    #[tokio::test]
    async fn test_invalid_route_returns_404() {
        let app = super::router(test::seed().0);
        let response = get(&app, "/aa/a").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("blob".parse::<super::Backend>(), Ok(super::Backend::Blob));
        assert_eq!("memory".parse::<super::Backend>(), Ok(super::Backend::Memory));
        assert!("s3".parse::<super::Backend>().is_err());
    }
}
