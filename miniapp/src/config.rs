//! Deployment configuration, read from the environment.
use std::fmt;

use thiserror::Error;

use crate::address::{Address, AddressError};
use crate::storage::blob::{self, BlobStore};
use crate::storage::StorageKey;

/// Environment variables read by the backend.
pub mod env {
    pub use std::env::*;

    /// Shared secret expected in the `x-api-key` header of mutating requests.
    pub const API_KEY: &str = "API_KEY";
    /// Deployment host, set by the hosting platform.
    pub const VERCEL_URL: &str = "VERCEL_URL";
    /// Public URL the app is served from.
    pub const NEXT_PUBLIC_URL: &str = "NEXT_PUBLIC_URL";
    /// Overrides the address kept in an otherwise empty list.
    pub const DEFAULT_ADDRESS: &str = "DEFAULT_ADDRESS";
    /// Read-write token of the blob store.
    pub const BLOB_READ_WRITE_TOKEN: &str = "BLOB_READ_WRITE_TOKEN";
    /// Blob API endpoint.
    pub const BLOB_API_URL: &str = "BLOB_API_URL";
}

/// Identifier reported when no deployment is known.
pub const LOCAL_DEPLOYMENT: &str = "local-development";

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid default address: {0}")]
    DefaultAddress(#[from] AddressError),
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),
}

#[derive(Clone)]
pub struct Config {
    /// Secret guarding mutations. Without it, every mutation is refused.
    pub api_key: Option<String>,
    /// Deployment host, eg. `my-app-git-main.vercel.app`.
    pub deployment: Option<String>,
    /// Root of the app's public URLs. May be empty.
    pub public_url: String,
    /// Stands in for an empty address list.
    pub default_address: Option<Address>,
    /// Blob API endpoint.
    pub blob_api: String,
    /// Blob API token.
    pub blob_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            deployment: None,
            public_url: String::new(),
            default_address: Some(Address::fallback()),
            blob_api: blob::DEFAULT_API_URL.to_owned(),
            blob_token: None,
        }
    }
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load the configuration from a variable lookup. Empty values count as unset.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |name: &str| var(name).filter(|v| !v.is_empty());
        let deployment = var(env::VERCEL_URL);
        let public_url = var(env::NEXT_PUBLIC_URL)
            .or_else(|| deployment.clone())
            .unwrap_or_default();
        let default_address = match var(env::DEFAULT_ADDRESS) {
            Some(addr) => Address::try_from(addr)?,
            None => Address::fallback(),
        };

        Ok(Self {
            api_key: var(env::API_KEY),
            deployment,
            public_url,
            default_address: Some(default_address),
            blob_api: var(env::BLOB_API_URL).unwrap_or_else(|| blob::DEFAULT_API_URL.to_owned()),
            blob_token: var(env::BLOB_READ_WRITE_TOKEN),
        })
    }

    /// Allow the address list to become empty.
    pub fn without_default_address(mut self) -> Self {
        self.default_address = None;
        self
    }

    /// Key of this deployment's address list.
    pub fn storage_key(&self) -> StorageKey {
        StorageKey::derive(self.deployment.as_deref())
    }

    /// Deployment identifier, for logging.
    pub fn deployment_id(&self) -> &str {
        self.deployment.as_deref().unwrap_or(LOCAL_DEPLOYMENT)
    }

    /// Host the app is served from, without scheme or path.
    pub fn public_host(&self) -> Option<&str> {
        let url = self.public_url.as_str();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        let host = host.split('/').next().unwrap_or(host);

        (!host.is_empty()).then_some(host)
    }

    /// Blob store client for this deployment.
    pub fn blob_store(&self) -> Result<BlobStore, Error> {
        let token = self
            .blob_token
            .as_deref()
            .ok_or(Error::Missing(env::BLOB_READ_WRITE_TOKEN))?;

        Ok(BlobStore::new(self.blob_api.as_str(), token))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("deployment", &self.deployment)
            .field("public_url", &self.public_url)
            .field("default_address", &self.default_address)
            .field("blob_api", &self.blob_api)
            .field("blob_token", &self.blob_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
