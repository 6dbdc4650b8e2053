use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use miniapp::address::Submission;

use crate::api::auth::Authorized;
use crate::api::axum_extra::AddressBody;
use crate::api::error::Error;
use crate::api::Context;

pub fn router(ctx: Context) -> Router {
    Router::new()
        .route(
            "/address",
            get(address_list_handler)
                .post(address_add_handler)
                .delete(address_remove_handler),
        )
        .with_state(ctx)
}

/// List allowed addresses.
/// `GET /address`
async fn address_list_handler(State(ctx): State<Context>) -> impl IntoResponse {
    let addresses = ctx
        .load()
        .await
        .map_err(|e| Error::Internal("Failed to fetch addresses", e))?;

    Ok::<_, Error>(Json(json!({ "addresses": addresses })))
}

/// Add an address.
/// `POST /address`
async fn address_add_handler(
    State(ctx): State<Context>,
    _auth: Authorized,
    AddressBody(submission): AddressBody,
) -> impl IntoResponse {
    let addr = match submission {
        Submission::Valid(addr) => addr,
        Submission::InvalidShape => return Err(Error::InvalidShape),
        Submission::InvalidFormat(_) => return Err(Error::InvalidFormat),
    };
    let internal = |e| Error::Internal("Failed to add address", e);
    let mut addresses = ctx.load().await.map_err(internal)?;

    if !addresses.insert(addr.clone()) {
        return Err(Error::Conflict);
    }
    ctx.save(addresses.clone()).await.map_err(internal)?;

    tracing::info!("Added address {addr}");

    Ok::<_, Error>(Json(json!({
        "message": "Address added successfully",
        "addresses": addresses,
    })))
}

/// Remove an address.
/// `DELETE /address`
async fn address_remove_handler(
    State(ctx): State<Context>,
    _auth: Authorized,
    AddressBody(submission): AddressBody,
) -> impl IntoResponse {
    // Only valid addresses are ever stored, so a malformed one is simply absent.
    let addr = match submission {
        Submission::Valid(addr) => String::from(addr),
        Submission::InvalidFormat(addr) => addr,
        Submission::InvalidShape => return Err(Error::InvalidShape),
    };
    let internal = |e| Error::Internal("Failed to remove address", e);
    let mut addresses = ctx.load().await.map_err(internal)?;

    if !addresses.remove(&addr) {
        return Err(Error::NotFound);
    }
    let addresses = ctx.seeded(addresses);
    ctx.save(addresses.clone()).await.map_err(internal)?;

    tracing::info!("Removed address {addr}");

    Ok::<_, Error>(Json(json!({
        "message": "Address removed successfully",
        "addresses": addresses,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod routes {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use miniapp::address::DEFAULT_ADDRESS;
    use miniapp::storage::memory::MemoryStore;
    use miniapp::{AddressList, Config};

    use crate::test::{self, delete, get, post, ALICE, API_KEY, BOB};

    fn address(addr: &str) -> Option<Body> {
        Some(Body::from(json!({ "address": addr }).to_string()))
    }

    /// What's currently persisted, bypassing the fallback substitution.
    fn stored(ctx: &crate::api::Context) -> Option<AddressList> {
        ctx.book().try_load().unwrap()
    }

    #[tokio::test]
    async fn test_address_lifecycle() {
        let app = super::router(test::seed().0);

        // Empty store.
        let response = get(&app, "/address").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await, json!({ "addresses": [DEFAULT_ADDRESS] }));

        // Add.
        let response = post(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.json().await,
            json!({
                "message": "Address added successfully",
                "addresses": [DEFAULT_ADDRESS, ALICE],
            })
        );
        let response = get(&app, "/address").await;
        assert_eq!(
            response.json().await,
            json!({ "addresses": [DEFAULT_ADDRESS, ALICE] })
        );

        // Add again.
        let response = post(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.json().await, json!({ "error": "Address already exists" }));

        // Remove.
        let response = delete(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.json().await,
            json!({
                "message": "Address removed successfully",
                "addresses": [DEFAULT_ADDRESS],
            })
        );
        let response = get(&app, "/address").await;
        assert_eq!(response.json().await, json!({ "addresses": [DEFAULT_ADDRESS] }));
    }

    #[tokio::test]
    async fn test_remove_last_address_keeps_default() {
        let (ctx, _) = test::seed();
        let app = super::router(ctx.clone());

        let response = delete(&app, "/address", address(DEFAULT_ADDRESS), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.json().await["addresses"],
            json!([DEFAULT_ADDRESS])
        );
        assert_eq!(
            stored(&ctx).unwrap().iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            vec![DEFAULT_ADDRESS]
        );
    }

    #[tokio::test]
    async fn test_without_default_address() {
        let config = test::config().without_default_address();
        let ctx = test::context(config, Arc::new(MemoryStore::default()));
        let app = super::router(ctx.clone());

        let response = get(&app, "/address").await;
        assert_eq!(response.json().await, json!({ "addresses": [] }));

        let response = post(&app, "/address", address(BOB), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = delete(&app, "/address", address(BOB), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await["addresses"], json!([]));
        assert_eq!(stored(&ctx), Some(AddressList::new()));
    }

    #[tokio::test]
    async fn test_addresses_are_case_sensitive() {
        let app = super::router(test::seed().0);
        let lower = ALICE.to_lowercase();

        let response = post(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = post(&app, "/address", address(&lower), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = delete(&app, "/address", address(&lower), Some(API_KEY)).await;
        assert_eq!(
            response.json().await["addresses"],
            json!([DEFAULT_ADDRESS, ALICE])
        );
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (ctx, _) = test::seed();
        let app = super::router(ctx.clone());
        let error = json!({ "error": "Unauthorized - Invalid or missing x-api-key header" });

        let response = post(&app, "/address", address(ALICE), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json().await, error);

        let response = post(&app, "/address", address(ALICE), Some("wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = delete(&app, "/address", address(DEFAULT_ADDRESS), Some("")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Auth is checked before the body.
        let response = post(&app, "/address", Some(Body::from("{")), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(stored(&ctx), None);
    }

    #[tokio::test]
    async fn test_unauthorized_without_configured_key() {
        let config = Config {
            api_key: None,
            ..test::config()
        };
        let ctx = test::context(config, Arc::new(MemoryStore::default()));
        let app = super::router(ctx.clone());

        let response = post(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = delete(&app, "/address", address(DEFAULT_ADDRESS), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(stored(&ctx), None);
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let (ctx, _) = test::seed();
        let app = super::router(ctx.clone());
        let shape = json!({ "error": "Address is required and must be a string" });

        for body in [
            Body::from(json!({ "address": 1 }).to_string()),
            Body::from(json!({ "address": "" }).to_string()),
            Body::from(json!({ "addr": ALICE }).to_string()),
            Body::from(json!([ALICE]).to_string()),
            Body::from("not json"),
            Body::empty(),
        ] {
            let response = post(&app, "/address", Some(body), Some(API_KEY)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(response.json().await, shape);
        }

        let response = delete(&app, "/address", Some(Body::from("{}")), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json().await, shape);

        for invalid in [
            "0x123",
            "52a457Bde54fDEaF72199AA6a62D5C027bC8Cbd8",
            "0xZZa457Bde54fDEaF72199AA6a62D5C027bC8Cbd8",
        ] {
            let response = post(&app, "/address", address(invalid), Some(API_KEY)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json().await,
                json!({ "error": "Invalid Ethereum address format" })
            );
        }
        assert_eq!(stored(&ctx), None);
    }

    #[tokio::test]
    async fn test_remove_absent() {
        let (ctx, _) = test::seed();
        let app = super::router(ctx.clone());

        let response = post(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let before = stored(&ctx);

        let response = delete(&app, "/address", address(BOB), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.json().await, json!({ "error": "Address not found" }));

        // Malformed addresses are never stored.
        let response = delete(&app, "/address", address("0x123"), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(stored(&ctx), before);
    }

    #[tokio::test]
    async fn test_store_write_failure() {
        let store = Arc::new(test::ReadOnlyStore::default());
        let ctx = test::context(test::config(), store);
        let app = super::router(ctx);

        let response = post(&app, "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json().await, json!({ "error": "Failed to add address" }));

        let response = delete(&app, "/address", address(DEFAULT_ADDRESS), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json().await,
            json!({ "error": "Failed to remove address" })
        );
    }

    #[tokio::test]
    async fn test_store_read_failure() {
        let store = Arc::new(test::UnreachableStore);
        let ctx = test::context(test::config(), store);
        let app = super::router(ctx);

        let response = get(&app, "/address").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json().await, json!({ "addresses": [DEFAULT_ADDRESS] }));
    }

    #[tokio::test]
    async fn test_deployments_are_isolated() {
        let store = Arc::new(MemoryStore::default());
        let prod = test::context(test::config(), store.clone());
        let preview = test::context(
            Config {
                deployment: Some(String::from("my-app-git-feature.vercel.app")),
                ..test::config()
            },
            store,
        );

        let response = post(&super::router(prod), "/address", address(ALICE), Some(API_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(&super::router(preview), "/address").await;
        assert_eq!(response.json().await, json!({ "addresses": [DEFAULT_ADDRESS] }));
    }
}
