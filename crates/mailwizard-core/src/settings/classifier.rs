//! Decides what the wizard must do with discovered settings.

use super::model::{AuthenticationType, IncomingServerSettings};

/// Classification of incoming server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// The preferred authentication mechanism is `OAuth2`.
    pub requires_oauth: bool,
    /// The settings are the provider shortcut's marker, not real parameters.
    pub is_placeholder: bool,
}

/// Classify incoming settings.
///
/// `OAuth2` is required only when it is the first (preferred) entry of the
/// server's authentication list.
#[must_use]
pub fn classify(settings: &IncomingServerSettings) -> Classification {
    match settings {
        IncomingServerSettings::Imap(server) | IncomingServerSettings::Pop3(server) => {
            Classification {
                requires_oauth: server.authentication_types.first()
                    == Some(&AuthenticationType::OAuth2),
                is_placeholder: false,
            }
        }
        IncomingServerSettings::Placeholder => Classification {
            requires_oauth: false,
            is_placeholder: true,
        },
    }
}
