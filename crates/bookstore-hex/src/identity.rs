use bookstore_types::domain::user::Principal;
use bookstore_types::ports::identity::IdentityProvider;
use std::collections::HashMap;

use crate::config::Config;

/// Fixed bearer-token table, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenIdentity {
    pub fn new(tokens: impl IntoIterator<Item = (String, Principal)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.auth_tokens.is_empty() {
            tracing::warn!("AUTH_TOKENS is empty; every authenticated route will answer 401");
        }
        Self::new(config.auth_tokens.iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn authenticate(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).copied()
    }
}
