//! Account onboarding wizard.
//!
//! The wizard walks through four steps:
//!
//! - **Address**: the user enters an email address; discovery runs.
//! - **Credential**: settings were found (or the user skipped a failed
//!   discovery); the user enters a password and approves untrusted settings.
//! - **`OAuth`**: the discovered incoming server requires `OAuth2`; the
//!   wizard waits for the authorization sub-flow.
//! - **Manual**: nothing was found; the user configures servers by hand.
//!
//! [`OnboardingStateMachine`] is synchronous and free of I/O. It returns a
//! [`Command`] for each [`Event`]; [`OnboardingSession`] executes discovery
//! commands on Tokio tasks and feeds the results back.

mod event;
mod machine;
mod oauth;
mod session;
mod state;

pub use event::{Command, DiscoveryRequest, DiscoveryTicket, Effect, Event};
pub use machine::OnboardingStateMachine;
pub use oauth::OAuthSubflow;
pub use session::OnboardingSession;
pub use state::{Step, WizardState};
