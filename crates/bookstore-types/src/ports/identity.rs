use crate::domain::user::Principal;

/// Resolves a bearer credential to a caller. Token issuance lives elsewhere.
pub trait IdentityProvider: Send + Sync + 'static {
    fn authenticate(&self, token: &str) -> Option<Principal>;
}
