//! Account-state handoff between the wizard and the rest of the application.

use std::sync::{Mutex, PoisonError};

use mailwizard_oauth::Token;
use serde::Serialize;
use tracing::debug;

use crate::settings::DiscoveredSettings;

/// Snapshot of a completed wizard, handed to the account-state repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountState {
    /// Email address.
    pub email_address: String,
    /// Password, if one was entered.
    pub password: Option<String>,
    /// Settings found by discovery, if any.
    pub discovered_settings: Option<DiscoveredSettings>,
    /// Token from the `OAuth2` sub-flow, if it ran.
    pub authorization_token: Option<Token>,
    /// Whether the discovered settings are used unchanged.
    pub is_automatic_config: bool,
}

/// Receives the wizard's result for the account being set up.
///
/// Both operations are best effort and idempotent.
pub trait AccountStateRepository: Send + Sync {
    /// Replace the pending account state.
    fn set_state(&self, state: AccountState);

    /// Drop any pending account state.
    fn clear(&self);
}

/// Repository holding the pending state in memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountStateRepository {
    state: Mutex<Option<AccountState>>,
}

impl InMemoryAccountStateRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pending state.
    #[must_use]
    pub fn get(&self) -> Option<AccountState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AccountStateRepository for InMemoryAccountStateRepository {
    fn set_state(&self, state: AccountState) {
        debug!("Storing account state for {}", state.email_address);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }

    fn clear(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn state() -> AccountState {
        AccountState {
            email_address: "user@example.com".to_string(),
            password: Some("secret".to_string()),
            discovered_settings: None,
            authorization_token: None,
            is_automatic_config: false,
        }
    }

    #[test]
    fn set_then_clear() {
        let repo = InMemoryAccountStateRepository::new();
        assert!(repo.get().is_none());

        repo.set_state(state());
        assert_eq!(repo.get().unwrap().email_address, "user@example.com");

        repo.clear();
        assert!(repo.get().is_none());
        repo.clear();
        assert!(repo.get().is_none());
    }

    #[test]
    fn serializes_snapshot() {
        let json = serde_json::to_value(state()).unwrap();
        assert_eq!(json["email_address"], "user@example.com");
        assert_eq!(json["is_automatic_config"], false);
    }
}
