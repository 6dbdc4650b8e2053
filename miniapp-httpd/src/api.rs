pub mod auth;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::{self, CorsLayer};

use miniapp::manifest::{Manifest, MiniApp};
use miniapp::{AddressBook, AddressList, Config, Store};

mod address;
mod axum_extra;

use crate::api::error::Backend;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct Context {
    config: Arc<Config>,
    book: Arc<AddressBook>,
    app: Arc<MiniApp>,
}

impl Context {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Result<Self, crate::error::Error> {
        let app = MiniApp::new(&config.public_url);
        let domain = app.validate()?;

        match config.public_host() {
            Some(host) if host != domain => {
                tracing::warn!("account association is signed for {domain}, but app is served from {host}");
            }
            _ => {}
        }
        let book = AddressBook::new(store, config.storage_key(), config.default_address.clone());

        Ok(Self {
            config: Arc::new(config),
            book: Arc::new(book),
            app: Arc::new(app),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the current address list. Store failures are recovered by the
    /// address book.
    pub async fn load(&self) -> Result<AddressList, Backend> {
        let book = self.book.clone();

        Ok(tokio::task::spawn_blocking(move || book.load()).await?)
    }

    /// Overwrite the address list.
    pub async fn save(&self, addresses: AddressList) -> Result<(), Backend> {
        let book = self.book.clone();

        tokio::task::spawn_blocking(move || book.save(&addresses)).await??;

        Ok(())
    }

    /// Substitute the default address for an empty list, if one is configured.
    pub fn seeded(&self, addresses: AddressList) -> AddressList {
        self.book.seeded(addresses)
    }

    /// The app manifest, advertising the given addresses.
    pub fn manifest(&self, addresses: AddressList) -> Manifest {
        self.app.manifest(addresses)
    }

    #[cfg(test)]
    pub fn book(&self) -> &AddressBook {
        &self.book
    }
}

pub fn router(ctx: Context) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .merge(address::router(ctx))
        .layer(
            CorsLayer::new()
                .max_age(Duration::from_secs(86400))
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([CONTENT_TYPE, HeaderName::from_static(auth::API_KEY_HEADER)]),
        )
}

async fn root_handler() -> impl IntoResponse {
    let response = json!({
        "path": "/api",
        "version": VERSION,
        "links": [
            {
                "href": "/address",
                "rel": "addresses",
                "type": "GET"
            },
            {
                "href": "/address",
                "rel": "addresses",
                "type": "POST"
            },
            {
                "href": "/address",
                "rel": "addresses",
                "type": "DELETE"
            }
        ]
    });

    Json(response)
}

#[cfg(test)]
mod routes {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    use crate::test::{self, get};

    #[tokio::test]
    async fn test_root() {
        let app = super::router(test::seed().0);
        let response = get(&app, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = response.json().await;
        assert_eq!(json["path"], "/api");
        assert_eq!(json["links"][0]["href"], "/address");
    }
}
