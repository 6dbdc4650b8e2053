//! Mini App manifest, served at `/.well-known/farcaster.json`.
//!
//! The manifest combines a pre-computed account association, which proves
//! that the domain belongs to a Farcaster account, with the app's static
//! metadata and the current address allow-list:
//!
//! ```json
//! {
//!   "baseBuilder": { "allowedAddresses": ["0x.."] },
//!   "accountAssociation": { "header": "..", "payload": "..", "signature": ".." },
//!   "miniapp": { "version": "1", "name": "..", "homeUrl": "..", .. }
//! }
//! ```
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::AddressList;

/// Signed association header: `{ fid, type, key }`.
pub const ASSOCIATION_HEADER: &str =
    "eyJmaWQiOjYxNjIsInR5cGUiOiJhdXRoIiwia2V5IjoiMHg1MmE0NTdCZGU1NGZERWFGNzIxOTlBQTZhNjJENUMwMjdiQzhDYmQ4In0";
/// Signed association payload: `{ domain }`.
pub const ASSOCIATION_PAYLOAD: &str =
    "eyJkb21haW4iOiJiYXNlLWRldi1leC0xLWdpdC11YXQtMDMtdHlwZW9mLXByb2plY3Qtdmlldy52ZXJjZWwuYXBwIn0";
/// Signature over header and payload.
pub const ASSOCIATION_SIGNATURE: &str =
    "0gpZ9fXwMk2AidKywflwvYwsOHWN21na6sgwhj16ea1jLP7gXWhtkyQZriT8bZbiDCzpUuhtAg3i201uKdlb3xs=";

/// App name.
pub const APP_NAME: &str = "base-dev-ex-1";

#[derive(Debug, Error)]
pub enum Error {
    #[error("account association is missing its {0}")]
    Missing(&'static str),
    #[error("account association {0} is not valid base64: {1}")]
    Base64(&'static str, base64::DecodeError),
    #[error("account association {0} is not valid JSON: {1}")]
    Json(&'static str, serde_json::Error),
}

/// Decoded association header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    /// Farcaster id of the owning account.
    pub fid: u64,
    #[serde(rename = "type")]
    pub kind: String,
    /// Custody or auth key that signed the association.
    pub key: String,
}

/// Decoded association payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payload {
    pub domain: String,
}

/// Binds a domain to a Farcaster account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl Default for AccountAssociation {
    fn default() -> Self {
        Self {
            header: ASSOCIATION_HEADER.to_owned(),
            payload: ASSOCIATION_PAYLOAD.to_owned(),
            signature: ASSOCIATION_SIGNATURE.to_owned(),
        }
    }
}

impl AccountAssociation {
    pub fn decode_header(&self) -> Result<Header, Error> {
        decode("header", &self.header)
    }

    pub fn decode_payload(&self) -> Result<Payload, Error> {
        decode("payload", &self.payload)
    }

    /// Check that all parts are present and that header and payload decode.
    pub fn verify(&self) -> Result<(Header, Payload), Error> {
        if self.signature.is_empty() {
            return Err(Error::Missing("signature"));
        }
        Ok((self.decode_header()?, self.decode_payload()?))
    }
}

fn decode<T: DeserializeOwned>(part: &'static str, input: &str) -> Result<T, Error> {
    if input.is_empty() {
        return Err(Error::Missing(part));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| Error::Base64(part, e))?;

    serde_json::from_slice(&bytes).map_err(|e| Error::Json(part, e))
}

/// App metadata. Empty fields are left out of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub version: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshot_urls: Vec<String>,
    pub icon_url: String,
    pub splash_image_url: String,
    pub splash_background_color: String,
    pub home_url: String,
    pub webhook_url: String,
    pub primary_category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub hero_image_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tagline: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_description: String,
    pub og_image_url: String,
}

impl Frame {
    /// Metadata of the app served from `root_url`.
    pub fn new(root_url: &str) -> Self {
        let root = root_url.trim_end_matches('/');

        Self {
            version: String::from("1"),
            name: String::from(APP_NAME),
            subtitle: String::new(),
            description: String::new(),
            screenshot_urls: Vec::new(),
            icon_url: format!("{root}/icon.png"),
            splash_image_url: format!("{root}/splash.png"),
            splash_background_color: String::from("#000000"),
            home_url: root.to_owned(),
            webhook_url: format!("{root}/api/webhook"),
            primary_category: String::from("utility"),
            tags: Vec::new(),
            hero_image_url: format!("{root}/hero.png"),
            tagline: String::new(),
            og_title: String::new(),
            og_description: String::new(),
            og_image_url: format!("{root}/hero.png"),
        }
    }
}

/// Signed app configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniApp {
    pub account_association: AccountAssociation,
    pub frame: Frame,
}

impl MiniApp {
    /// The app served from `root_url`, with its pre-computed association.
    pub fn new(root_url: &str) -> Self {
        Self {
            account_association: AccountAssociation::default(),
            frame: Frame::new(root_url),
        }
    }

    /// Check the account association, returning the domain it was signed for.
    pub fn validate(&self) -> Result<String, Error> {
        let (_, payload) = self.account_association.verify()?;

        Ok(payload.domain)
    }

    /// Build the manifest advertising the given addresses.
    pub fn manifest(&self, allowed_addresses: AddressList) -> Manifest {
        Manifest {
            base_builder: BaseBuilder { allowed_addresses },
            account_association: self.account_association.clone(),
            miniapp: self.frame.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseBuilder {
    pub allowed_addresses: AddressList,
}

/// The served manifest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub base_builder: BaseBuilder,
    pub account_association: AccountAssociation,
    pub miniapp: Frame,
}
