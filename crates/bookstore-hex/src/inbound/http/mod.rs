//! axum adapter: router, bearer-token extractor and JSON handlers.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::Authenticated;
pub use server::{AppState, HttpServer, HttpServerConfig};
