//! Wizard state.

use mailwizard_oauth::Token;

use crate::account::AccountState;
use crate::discovery::DiscoveryError;
use crate::field::InputField;
use crate::settings::DiscoveredSettings;

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    /// Email address entry.
    #[default]
    Address,
    /// Password entry and settings approval.
    Credential,
    /// `OAuth2` authorization sub-flow.
    OAuth,
    /// Manual server setup.
    Manual,
}

/// Everything the wizard knows about the account being set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    /// Current step.
    pub step: Step,
    /// Email address input.
    pub email_address: InputField<String>,
    /// Password input.
    pub password: InputField<String>,
    /// Whether the user approved untrusted settings.
    pub configuration_approved: InputField<bool>,
    /// Settings from the last successful discovery for this address.
    pub discovered_settings: Option<DiscoveredSettings>,
    /// A discovery request is in flight.
    pub is_loading: bool,
    /// Error from the last discovery, shown with a retry affordance.
    pub last_error: Option<DiscoveryError>,
    /// Forward navigation is allowed.
    pub is_next_action_visible: bool,
    /// Token from a completed `OAuth2` sub-flow.
    pub authorization_token: Option<Token>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: Step::Address,
            email_address: InputField::default(),
            password: InputField::default(),
            configuration_approved: InputField::default(),
            discovered_settings: None,
            is_loading: false,
            last_error: None,
            is_next_action_visible: true,
            authorization_token: None,
        }
    }
}

impl WizardState {
    /// Create the initial state for an address, e.g. one prefilled by the caller.
    #[must_use]
    pub fn with_email_address(email_address: impl Into<String>) -> Self {
        Self {
            email_address: InputField::new(email_address.into()),
            ..Self::default()
        }
    }

    /// Trust of the discovered settings, `None` if nothing was discovered.
    #[must_use]
    pub fn is_trusted(&self) -> Option<bool> {
        self.discovered_settings
            .as_ref()
            .map(|settings| settings.is_trusted)
    }

    /// Snapshot for the account-state repository.
    #[must_use]
    pub fn to_account_state(&self, is_automatic_config: bool) -> AccountState {
        let password = self.password.value();
        AccountState {
            email_address: self.email_address.value().trim().to_string(),
            password: (!password.is_empty()).then(|| password.clone()),
            discovered_settings: self.discovered_settings.clone(),
            authorization_token: self.authorization_token.clone(),
            is_automatic_config,
        }
    }
}
