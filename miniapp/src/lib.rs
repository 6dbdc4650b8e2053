#![allow(clippy::type_complexity)]
pub mod address;
pub mod config;
pub mod manifest;
pub mod storage;

pub use address::{Address, AddressList};
pub use config::Config;
pub use storage::{AddressBook, Store, StorageKey};
