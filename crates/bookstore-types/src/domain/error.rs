use thiserror::Error;

/// Precondition failures detected before anything is persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Quantity must be between 1 and 99, got {0}")]
    QuantityOutOfRange(i64),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must not exceed {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("Invalid zip code format")]
    InvalidZipCode,

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Invalid status. Must be one of: Pending, Placed, Shipped, Delivered (got {0})")]
    InvalidStatus(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Price must not be negative")]
    NegativePrice,

    #[error("Order must contain at least one line")]
    EmptyOrder,

    #[error("Order total exceeds the supported amount")]
    AmountOverflow,

    #[error("Rating must be an integer between 1 and 5, got {0}")]
    RatingOutOfRange(i64),
}
