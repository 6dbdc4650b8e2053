use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};

use miniapp::address::Submission;

use crate::api::error::Error;

/// A `{ "address": .. }` request body, classified.
///
/// Unlike `axum::Json`, this never rejects on content type or malformed
/// JSON: every body yields a [`Submission`], and it is up to the handler to
/// turn invalid ones into errors.
pub struct AddressBody(pub Submission);

#[async_trait]
impl<S> FromRequest<S> for AddressBody
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| Error::InvalidShape)?;

        Ok(Self(Submission::from_slice(&body)))
    }
}
