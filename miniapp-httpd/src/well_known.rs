use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::error::Error;
use crate::api::Context;

pub fn router(ctx: Context) -> Router {
    Router::new()
        .route("/.well-known/farcaster.json", get(manifest_handler))
        .with_state(ctx)
}

/// Return the Mini App manifest.
/// `GET /.well-known/farcaster.json`
async fn manifest_handler(State(ctx): State<Context>) -> impl IntoResponse {
    let addresses = ctx
        .load()
        .await
        .map_err(|e| Error::Internal("Failed to fetch addresses", e))?;

    Ok::<_, Error>(Json(ctx.manifest(addresses)))
}
