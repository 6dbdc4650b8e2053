//! Vercel Blob HTTP backend.
use std::fmt;
use std::io::Read as _;

use serde::Deserialize;

use super::{Blob, Error, Store};

/// Default blob API endpoint.
pub const DEFAULT_API_URL: &str = "https://blob.vercel-storage.com";
/// Blob API version we speak.
pub const API_VERSION: &str = "7";

#[derive(Deserialize)]
struct ListResponse {
    blobs: Vec<Blob>,
}

/// Blob store client. Objects are written public, without random suffix,
/// overwriting any previous version.
#[derive(Clone)]
pub struct BlobStore {
    agent: ureq::Agent,
    api: String,
    token: String,
}

impl BlobStore {
    pub fn new(api: impl Into<String>, token: impl Into<String>) -> Self {
        let api = api.into().trim_end_matches('/').to_owned();

        Self {
            agent: ureq::AgentBuilder::new().build(),
            api,
            token: token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl Store for BlobStore {
    fn list(&self, prefix: &str) -> Result<Vec<Blob>, Error> {
        let response: ListResponse = self
            .agent
            .get(&format!("{}/", self.api))
            .query("prefix", prefix)
            .set("authorization", &self.authorization())
            .set("x-api-version", API_VERSION)
            .call()?
            .into_json()?;

        Ok(response.blobs)
    }

    fn fetch(&self, blob: &Blob) -> Result<Vec<u8>, Error> {
        let response = match self.agent.get(&blob.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Err(Error::NotFound(blob.url.clone())),
            Err(e) => return Err(e.into()),
        };
        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;

        Ok(body)
    }

    fn put(&self, pathname: &str, body: Vec<u8>) -> Result<Blob, Error> {
        let blob: Blob = self
            .agent
            .put(&format!("{}/{pathname}", self.api))
            .set("authorization", &self.authorization())
            .set("x-api-version", API_VERSION)
            .set("x-content-type", "application/json")
            .set("x-add-random-suffix", "0")
            .set("x-allow-overwrite", "1")
            .set("x-vercel-blob-access", "public")
            .send_bytes(&body)?
            .into_json()?;

        Ok(blob)
    }
}
