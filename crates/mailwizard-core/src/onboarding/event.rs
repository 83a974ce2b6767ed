//! Events consumed and commands produced by the state machine.

use mailwizard_oauth::OAuthResult;

use crate::discovery::DiscoveryOutcome;
use crate::settings::IncomingProtocolType;

/// Identifies one discovery request; results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveryTicket(pub u64);

/// Input to the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// The email address was edited.
    AddressChanged(String),
    /// The password was edited.
    PasswordChanged(String),
    /// The settings approval checkbox was toggled.
    ApprovalChanged(bool),
    /// Forward navigation.
    Next,
    /// Backward navigation.
    Back,
    /// Retry discovery after an error.
    Retry,
    /// The `OAuth2` sub-flow finished.
    OAuthResult(OAuthResult),
    /// The user wants to edit discovered settings by hand.
    EditConfigurationClicked,
    /// A discovery request finished.
    DiscoveryCompleted {
        /// Ticket of the request.
        ticket: DiscoveryTicket,
        /// What it found.
        outcome: DiscoveryOutcome,
    },
}

/// Navigation effect for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Leave the wizard backwards.
    NavigateBack,
    /// Leave the wizard forwards.
    NavigateNext {
        /// Whether discovered settings are used unchanged.
        is_automatic_config: bool,
        /// Incoming protocol of the discovered settings; `None` if unknown.
        incoming_protocol_type: Option<IncomingProtocolType>,
    },
}

/// Discovery the driver must run and report back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    /// Ticket to return with the outcome.
    pub ticket: DiscoveryTicket,
    /// Address to discover settings for.
    pub email_address: String,
}

/// Work requested by the state machine after handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Command {
    /// Nothing to do.
    None,
    /// Run discovery and send back [`Event::DiscoveryCompleted`].
    Discover(DiscoveryRequest),
    /// Deliver a navigation effect.
    Emit(Effect),
}
