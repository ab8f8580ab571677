pub mod book;
pub mod cart;
pub mod error;
pub mod order;
pub mod review;
pub mod user;

pub use error::ValidationError;
