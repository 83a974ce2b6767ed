//! # mailwizard-core
//!
//! Account onboarding for an email client.
//!
//! This crate provides:
//! - Server settings discovery (MX-over-DoH provider shortcut with
//!   autodiscovery fallback)
//! - Settings classification (`OAuth2` required, placeholder)
//! - Input validation
//! - The onboarding wizard state machine and its async driver
//! - Wizard configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod discovery;
mod error;
pub mod field;
pub mod onboarding;
pub mod settings;
pub mod validation;

pub use account::{AccountState, AccountStateRepository, InMemoryAccountStateRepository};
pub use config::{DiscoveryConfig, DohProvider, ProviderShortcutConfig, WizardConfig};
pub use discovery::{
    DefaultCoordinator, DiscoveryCoordinator, DiscoveryError, DiscoveryOutcome, DiscoveryProbe,
    default_coordinator,
};
pub use error::{Error, Result};
pub use field::InputField;
pub use onboarding::{
    Command, DiscoveryRequest, DiscoveryTicket, Effect, Event, OAuthSubflow, OnboardingSession,
    OnboardingStateMachine, Step, WizardState,
};
pub use settings::{
    AuthenticationType, Classification, ConnectionSecurity, DiscoveredSettings,
    IncomingProtocolType, IncomingServerSettings, OutgoingServerSettings, ServerSettings, classify,
};
pub use validation::{DefaultValidator, ValidationError, ValidationResult, Validator};
