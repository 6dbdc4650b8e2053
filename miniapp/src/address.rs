//! Ethereum addresses and the allow-list they are kept in.
//!
//! Addresses are compared as plain strings: `0xabc..` and `0xABC..` are two
//! different entries. No checksum normalization is applied, the list stores
//! exactly what was submitted.
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address prefix.
pub const HEX_PREFIX: &str = "0x";
/// Number of hex digits following the prefix.
pub const HEX_DIGITS: usize = 40;
/// Address kept in the allow-list when it would otherwise be empty.
/// This is the custody key of the app's account association.
pub const DEFAULT_ADDRESS: &str = "0x52a457Bde54fDEaF72199AA6a62D5C027bC8Cbd8";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid ethereum address {0:?}: missing `0x` prefix")]
    MissingPrefix(String),
    #[error("invalid ethereum address {0:?}: expected 40 hex digits")]
    InvalidLength(String),
    #[error("invalid ethereum address {0:?}: non-hex character")]
    InvalidDigit(String),
}

/// Check that the input is `0x` followed by exactly 40 hex digits, in any case.
pub fn is_valid_ethereum_address(input: &str) -> bool {
    Address::check(input).is_ok()
}

/// An Ethereum address, stored as submitted.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(String);

impl Address {
    fn check(input: &str) -> Result<(), AddressError> {
        let Some(digits) = input.strip_prefix(HEX_PREFIX) else {
            return Err(AddressError::MissingPrefix(input.to_owned()));
        };
        if digits.len() != HEX_DIGITS {
            return Err(AddressError::InvalidLength(input.to_owned()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidDigit(input.to_owned()));
        }
        Ok(())
    }

    /// The [`DEFAULT_ADDRESS`].
    pub fn fallback() -> Self {
        Self(DEFAULT_ADDRESS.to_owned())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::check(s)?;

        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::check(&value)?;

        Ok(Self(value))
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl Deref for Address {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .try_into()
            .map_err(serde::de::Error::custom)
    }
}

/// An ordered list of addresses without duplicates.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressList(Vec<Address>);

impl AddressList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the exact address is in the list.
    pub fn contains(&self, addr: &str) -> bool {
        self.0.iter().any(|a| a.as_str() == addr)
    }

    /// Append an address. Returns `false` if it was already present.
    pub fn insert(&mut self, addr: Address) -> bool {
        if self.contains(&addr) {
            return false;
        }
        self.0.push(addr);

        true
    }

    /// Remove every exact match of the address. Returns `false` if nothing was removed.
    pub fn remove(&mut self, addr: &str) -> bool {
        let len = self.0.len();
        self.0.retain(|a| a.as_str() != addr);

        self.0.len() != len
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.0.iter()
    }
}

impl FromIterator<Address> for AddressList {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        let mut list = Self::new();
        for addr in iter {
            list.insert(addr);
        }
        list
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for AddressList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<String>::deserialize(deserializer)?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| match Address::try_from(entry) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    log::warn!(target: "miniapp", "Skipping stored entry: {e}");
                    None
                }
            })
            .collect())
    }
}

/// Outcome of validating a `{ "address": .. }` request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A well-formed address.
    Valid(Address),
    /// Not an object, no `address` field, or a field that isn't a non-empty string.
    InvalidShape,
    /// A string that isn't an Ethereum address.
    InvalidFormat(String),
}

impl Submission {
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(field) = value.get("address") else {
            return Self::InvalidShape;
        };
        match field.as_str() {
            None | Some("") => Self::InvalidShape,
            Some(s) => match Address::from_str(s) {
                Ok(addr) => Self::Valid(addr),
                Err(_) => Self::InvalidFormat(s.to_owned()),
            },
        }
    }

    /// Parse a raw request body. Anything that isn't JSON is a shape error.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::InvalidShape,
        }
    }
}
