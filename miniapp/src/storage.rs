//! Address list persistence.
//!
//! The list lives in a single JSON document in a blob store:
//!
//!   allowed-addresses.json                         # Shared key, no deployment known
//!   addresses_my_app_git_main_team_vercel_app.json # Key scoped to one deployment
//!
//! Every deployment gets its own document, so preview deployments never
//! touch the production list.
pub mod blob;
pub mod memory;

use std::fmt;
use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{Address, AddressList};

/// Key used when no deployment identifier is available.
pub const SHARED_KEY: &str = "allowed-addresses.json";

#[derive(Debug, Error)]
pub enum Error {
    /// Transport or HTTP status error talking to the blob API.
    #[error("blob request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// Document could not be encoded or decoded.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    /// The object at this URL does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

/// Name of the document holding a deployment's address list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for a deployment, eg. `my-app.vercel.app`.
    ///
    /// The scheme is ignored, and `.` and `-` become `_`. Without an
    /// identifier, the [`SHARED_KEY`] is used.
    pub fn derive(deployment: Option<&str>) -> Self {
        match deployment {
            Some(id) if !id.is_empty() => {
                let host = id
                    .strip_prefix("https://")
                    .or_else(|| id.strip_prefix("http://"))
                    .unwrap_or(id);
                let normalized = host.replace(['.', '-'], "_");

                Self(format!("addresses_{normalized}.json"))
            }
            _ => Self::shared(),
        }
    }

    pub fn shared() -> Self {
        Self(SHARED_KEY.to_owned())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// Object key.
    pub pathname: String,
    /// Public URL the content can be fetched from.
    pub url: String,
}

/// Key-addressed object storage with public-read URLs.
pub trait Store: Send + Sync {
    /// List the objects whose pathname starts with `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<Blob>, Error>;
    /// Fetch an object's content.
    fn fetch(&self, blob: &Blob) -> Result<Vec<u8>, Error>;
    /// Create or overwrite a publicly readable object.
    fn put(&self, pathname: &str, body: Vec<u8>) -> Result<Blob, Error>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn list(&self, prefix: &str) -> Result<Vec<Blob>, Error> {
        self.as_ref().list(prefix)
    }

    fn fetch(&self, blob: &Blob) -> Result<Vec<u8>, Error> {
        self.as_ref().fetch(blob)
    }

    fn put(&self, pathname: &str, body: Vec<u8>) -> Result<Blob, Error> {
        self.as_ref().put(pathname, body)
    }
}

/// Persisted document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Document {
    pub addresses: AddressList,
}

/// The address list of one deployment.
pub struct AddressBook {
    store: Arc<dyn Store>,
    key: StorageKey,
    fallback: Option<Address>,
}

impl AddressBook {
    /// Create an address book. When a `fallback` is given, it stands in for
    /// a missing or empty list.
    pub fn new(store: Arc<dyn Store>, key: StorageKey, fallback: Option<Address>) -> Self {
        Self {
            store,
            key,
            fallback,
        }
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    /// Read the stored list, if any.
    pub fn try_load(&self) -> Result<Option<AddressList>, Error> {
        let blobs = self.store.list(self.key.as_str())?;
        let Some(blob) = blobs
            .iter()
            .find(|b| b.pathname == self.key.as_str())
            .or_else(|| blobs.first())
        else {
            return Ok(None);
        };
        let body = self.store.fetch(blob)?;
        let doc: Document = serde_json::from_slice(&body)?;

        Ok(Some(doc.addresses))
    }

    /// Read the stored list. Never fails: read errors are logged and treated
    /// as a missing list, and a missing or empty list is seeded with the
    /// fallback address, if any.
    pub fn load(&self) -> AddressList {
        let list = match self.try_load() {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                log::error!(target: "miniapp", "Error fetching addresses from {}: {e}", self.key);
                AddressList::new()
            }
        };
        self.seeded(list)
    }

    /// Overwrite the stored list.
    pub fn save(&self, addresses: &AddressList) -> Result<(), Error> {
        let body = serde_json::to_vec(&Document {
            addresses: addresses.clone(),
        })?;
        let blob = self.store.put(self.key.as_str(), body)?;

        log::debug!(target: "miniapp", "Saved {} address(es) to {}", addresses.len(), blob.url);

        Ok(())
    }

    /// Substitute the fallback for an empty list.
    pub fn seeded(&self, list: AddressList) -> AddressList {
        match &self.fallback {
            Some(addr) if list.is_empty() => [addr.clone()].into_iter().collect(),
            _ => list,
        }
    }
}

impl fmt::Debug for AddressBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressBook")
            .field("key", &self.key)
            .field("fallback", &self.fallback)
            .finish()
    }
}
