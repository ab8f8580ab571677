//! bookstore-hex: application core of the bookstore API plus its HTTP adapter.
//!
//! Services take any [`ports::Store`]; the binary picks the adapter.

pub mod config;
pub mod errors;
pub mod identity;

pub mod application;

pub use bookstore_types::{api, domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
