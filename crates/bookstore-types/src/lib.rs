//! bookstore-types: domain model, port traits and HTTP wire bodies shared by every crate.

pub mod api;
pub mod domain;
pub mod ports;
