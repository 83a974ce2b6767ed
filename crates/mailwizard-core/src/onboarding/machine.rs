//! The onboarding state machine.

use std::sync::Arc;

use mailwizard_oauth::OAuthResult;
use tracing::{debug, info, warn};

use super::event::{Command, DiscoveryRequest, DiscoveryTicket, Effect, Event};
use super::oauth::OAuthSubflow;
use super::state::{Step, WizardState};
use crate::account::AccountStateRepository;
use crate::discovery::{DiscoveryError, DiscoveryOutcome};
use crate::field::InputField;
use crate::settings::{DiscoveredSettings, classify};
use crate::validation::Validator;

/// Drives the wizard: `update` applies one event and says what to do next.
///
/// The machine never performs I/O besides calling its collaborators. Discovery
/// is requested through [`Command::Discover`]; the caller runs it and feeds the
/// result back as [`Event::DiscoveryCompleted`].
pub struct OnboardingStateMachine<O> {
    state: WizardState,
    validator: Box<dyn Validator>,
    repository: Arc<dyn AccountStateRepository>,
    oauth: O,
    active_ticket: Option<DiscoveryTicket>,
    last_ticket: u64,
}

impl<O: OAuthSubflow> OnboardingStateMachine<O> {
    /// Create a machine at the address step.
    pub fn new(
        validator: Box<dyn Validator>,
        repository: Arc<dyn AccountStateRepository>,
        oauth: O,
    ) -> Self {
        Self::with_state(WizardState::default(), validator, repository, oauth)
    }

    /// Create a machine from an existing state.
    pub fn with_state(
        state: WizardState,
        validator: Box<dyn Validator>,
        repository: Arc<dyn AccountStateRepository>,
        oauth: O,
    ) -> Self {
        Self {
            state,
            validator,
            repository,
            oauth,
            active_ticket: None,
            last_ticket: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WizardState {
        &self.state
    }

    /// The `OAuth2` sub-flow.
    #[must_use]
    pub const fn oauth(&self) -> &O {
        &self.oauth
    }

    /// The `OAuth2` sub-flow, for driving authorization.
    pub const fn oauth_mut(&mut self) -> &mut O {
        &mut self.oauth
    }

    /// Apply one event.
    pub fn update(&mut self, event: Event) -> Command {
        match event {
            Event::AddressChanged(email_address) => {
                self.change_address(email_address);
                Command::None
            }
            Event::PasswordChanged(password) => {
                self.state.password.update(password);
                Command::None
            }
            Event::ApprovalChanged(approved) => {
                self.state.configuration_approved.update(approved);
                Command::None
            }
            Event::Next => self.next(),
            Event::Back => self.back(),
            Event::Retry => {
                if self.state.step != Step::Address || self.state.is_loading {
                    return Command::None;
                }
                self.state.last_error = None;
                self.submit_address()
            }
            Event::OAuthResult(result) => self.on_oauth_result(result),
            Event::EditConfigurationClicked => {
                if self.state.discovered_settings.is_some() {
                    self.complete(false)
                } else {
                    Command::None
                }
            }
            Event::DiscoveryCompleted { ticket, outcome } => {
                self.on_discovery_completed(ticket, outcome);
                Command::None
            }
        }
    }

    fn change_address(&mut self, email_address: String) {
        if let Some(ticket) = self.active_ticket.take() {
            debug!("Address changed, superseding discovery {}", ticket.0);
        }

        let state = &mut self.state;
        state.email_address.update(email_address);
        state.discovered_settings = None;
        state.last_error = None;
        state.configuration_approved = InputField::default();
        state.authorization_token = None;
        state.is_loading = false;
        state.step = Step::Address;
        state.is_next_action_visible = true;

        self.repository.clear();
    }

    fn next(&mut self) -> Command {
        match self.state.step {
            Step::Address => {
                if self.state.is_loading {
                    return Command::None;
                }
                if self.state.last_error.take().is_some() {
                    // Skip discovery and continue with manual entry
                    self.state.step = Step::Credential;
                    self.state.is_next_action_visible = true;
                    return Command::None;
                }
                self.submit_address()
            }
            Step::Credential => self.submit_credentials(),
            Step::OAuth => Command::None,
            Step::Manual => self.complete(false),
        }
    }

    fn back(&mut self) -> Command {
        match self.state.step {
            Step::Address => {
                if self.state.last_error.take().is_some() {
                    Command::None
                } else {
                    Command::Emit(Effect::NavigateBack)
                }
            }
            Step::Credential | Step::OAuth | Step::Manual => {
                self.state.step = Step::Address;
                self.state.password = InputField::default();
                self.state.is_next_action_visible = true;
                Command::None
            }
        }
    }

    fn submit_address(&mut self) -> Command {
        let result = self
            .validator
            .validate_email_address(self.state.email_address.value());
        if self.state.email_address.apply(result) {
            self.start_discovery()
        } else {
            Command::None
        }
    }

    fn submit_credentials(&mut self) -> Command {
        let email = self
            .validator
            .validate_email_address(self.state.email_address.value());
        let password = self.validator.validate_password(self.state.password.value());
        let approval = self.validator.validate_configuration_approval(
            *self.state.configuration_approved.value(),
            self.state.is_trusted(),
        );

        // Apply all three so every failing field shows its error
        let email_ok = self.state.email_address.apply(email);
        let password_ok = self.state.password.apply(password);
        let approval_ok = self.state.configuration_approved.apply(approval);

        if email_ok && password_ok && approval_ok {
            self.complete(self.state.discovered_settings.is_some())
        } else {
            Command::None
        }
    }

    fn start_discovery(&mut self) -> Command {
        self.last_ticket += 1;
        let ticket = DiscoveryTicket(self.last_ticket);
        self.active_ticket = Some(ticket);
        self.state.is_loading = true;

        let email_address = self.state.email_address.value().trim().to_string();
        debug!("Starting discovery {} for {email_address}", ticket.0);
        Command::Discover(DiscoveryRequest {
            ticket,
            email_address,
        })
    }

    fn on_discovery_completed(&mut self, ticket: DiscoveryTicket, outcome: DiscoveryOutcome) {
        if self.active_ticket != Some(ticket) {
            debug!("Ignoring stale discovery result {}", ticket.0);
            return;
        }
        self.active_ticket = None;
        self.state.is_loading = false;

        match outcome {
            DiscoveryOutcome::Found(settings) => self.on_settings_found(settings),
            DiscoveryOutcome::NotFound => {
                info!("No settings found, continuing with manual setup");
                self.state.discovered_settings = None;
                self.state.last_error = None;
                self.state.step = Step::Manual;
                self.state.is_next_action_visible = true;
            }
            DiscoveryOutcome::NetworkError => self.on_discovery_failed(DiscoveryError::Network),
            DiscoveryOutcome::UnknownError => self.on_discovery_failed(DiscoveryError::Unknown),
        }
    }

    fn on_settings_found(&mut self, settings: DiscoveredSettings) {
        let classification = classify(&settings.incoming);
        self.state.last_error = None;

        match settings.incoming.hostname() {
            Some(hostname) if classification.requires_oauth => {
                info!("{hostname} requires OAuth2");
                self.oauth
                    .init_state(hostname, self.state.email_address.value().trim());
                self.state.step = Step::OAuth;
                self.state.is_next_action_visible = false;
            }
            _ => {
                if classification.is_placeholder {
                    info!("Provider recognized, server parameters unresolved");
                }
                self.state.step = Step::Credential;
                self.state.is_next_action_visible = true;
            }
        }

        self.state.discovered_settings = Some(settings);
    }

    fn on_discovery_failed(&mut self, error: DiscoveryError) {
        info!("Discovery failed: {error}");
        self.state.discovered_settings = None;
        self.state.last_error = Some(error);
        self.state.step = Step::Address;
    }

    fn on_oauth_result(&mut self, result: OAuthResult) -> Command {
        if self.state.step != Step::OAuth {
            debug!("Ignoring OAuth2 result outside the OAuth step");
            return Command::None;
        }

        match result {
            OAuthResult::Success(token) if token.is_expired() => {
                warn!("Ignoring OAuth2 token that is already expired");
                self.state.authorization_token = None;
                Command::None
            }
            OAuthResult::Success(token) => {
                self.state.authorization_token = Some(token);
                self.complete(true)
            }
            OAuthResult::Canceled | OAuthResult::Failure(_) => {
                self.state.authorization_token = None;
                Command::None
            }
        }
    }

    fn complete(&self, is_automatic_config: bool) -> Command {
        self.repository
            .set_state(self.state.to_account_state(is_automatic_config));

        let incoming_protocol_type = self
            .state
            .discovered_settings
            .as_ref()
            .and_then(|settings| settings.incoming.protocol_type());

        info!(
            "Onboarding complete (automatic: {is_automatic_config}, protocol: {})",
            incoming_protocol_type.map_or("unknown", |p| p.as_str())
        );
        Command::Emit(Effect::NavigateNext {
            is_automatic_config,
            incoming_protocol_type,
        })
    }
}

impl<O> std::fmt::Debug for OnboardingStateMachine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingStateMachine")
            .field("state", &self.state)
            .field("active_ticket", &self.active_ticket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use mailwizard_oauth::Token;
    use mailwizard_oauth::token::TokenResponse;

    use super::*;
    use crate::account::InMemoryAccountStateRepository;
    use crate::settings::{
        AuthenticationType, ConnectionSecurity, IncomingProtocolType, IncomingServerSettings,
        ServerSettings,
    };
    use crate::validation::{DefaultValidator, ValidationError};

    #[derive(Debug, Default)]
    struct RecordingOAuth {
        calls: Vec<(String, String)>,
    }

    impl OAuthSubflow for RecordingOAuth {
        fn init_state(&mut self, hostname: &str, email_address: &str) {
            self.calls
                .push((hostname.to_string(), email_address.to_string()));
        }
    }

    struct Fixture {
        machine: OnboardingStateMachine<RecordingOAuth>,
        repository: Arc<InMemoryAccountStateRepository>,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryAccountStateRepository::new());
        let machine = OnboardingStateMachine::new(
            Box::new(DefaultValidator),
            repository.clone(),
            RecordingOAuth::default(),
        );
        Fixture {
            machine,
            repository,
        }
    }

    fn imap(
        authentication_types: Vec<AuthenticationType>,
        is_trusted: bool,
    ) -> DiscoveredSettings {
        DiscoveredSettings {
            incoming: IncomingServerSettings::Imap(ServerSettings {
                hostname: "imap.example.com".to_string(),
                port: 993,
                security: ConnectionSecurity::Tls,
                username: "user@example.com".to_string(),
                authentication_types,
            }),
            outgoing: None,
            is_trusted,
        }
    }

    fn password_imap() -> DiscoveredSettings {
        imap(vec![AuthenticationType::PasswordCleartext], true)
    }

    /// Enter an address and press next; returns the discovery request.
    fn submit(
        machine: &mut OnboardingStateMachine<RecordingOAuth>,
        address: &str,
    ) -> DiscoveryRequest {
        assert_eq!(
            machine.update(Event::AddressChanged(address.to_string())),
            Command::None
        );
        match machine.update(Event::Next) {
            Command::Discover(request) => request,
            other => panic!("expected discovery, got {other:?}"),
        }
    }

    fn resolve(
        machine: &mut OnboardingStateMachine<RecordingOAuth>,
        request: &DiscoveryRequest,
        outcome: DiscoveryOutcome,
    ) {
        let command = machine.update(Event::DiscoveryCompleted {
            ticket: request.ticket,
            outcome,
        });
        assert_eq!(command, Command::None);
    }

    mod address_step_tests {
        use super::*;

        #[test]
        fn valid_address_starts_discovery() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, " user@example.com ");
            assert_eq!(request.email_address, "user@example.com");
            assert!(machine.state().is_loading);
            assert_eq!(machine.state().step, Step::Address);
        }

        #[test]
        fn invalid_address_sets_error_without_discovery() {
            let Fixture { mut machine, .. } = fixture();
            machine.update(Event::AddressChanged("not-an-address".to_string()));
            assert_eq!(machine.update(Event::Next), Command::None);
            assert_eq!(
                machine.state().email_address.error(),
                Some(&ValidationError::InvalidEmail)
            );
            assert!(!machine.state().is_loading);
        }

        #[test]
        fn next_while_loading_is_ignored() {
            let Fixture { mut machine, .. } = fixture();
            submit(&mut machine, "user@example.com");
            assert_eq!(machine.update(Event::Next), Command::None);
        }

        #[test]
        fn back_without_error_leaves_wizard() {
            let Fixture { mut machine, .. } = fixture();
            assert_eq!(
                machine.update(Event::Back),
                Command::Emit(Effect::NavigateBack)
            );
        }

        #[test]
        fn back_with_error_only_clears_it() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(&mut machine, &request, DiscoveryOutcome::NetworkError);

            assert_eq!(machine.update(Event::Back), Command::None);
            assert!(machine.state().last_error.is_none());
            assert_eq!(machine.state().step, Step::Address);
        }

        #[test]
        fn next_with_error_skips_to_credentials() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(&mut machine, &request, DiscoveryOutcome::UnknownError);

            assert_eq!(machine.update(Event::Next), Command::None);
            assert_eq!(machine.state().step, Step::Credential);
            assert!(machine.state().last_error.is_none());
            assert!(machine.state().is_next_action_visible);
        }

        #[test]
        fn address_change_resets_everything() {
            let Fixture {
                mut machine,
                repository,
            } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(
                &mut machine,
                &request,
                DiscoveryOutcome::Found(imap(vec![AuthenticationType::OAuth2], true)),
            );
            machine.update(Event::ApprovalChanged(true));
            repository.set_state(machine.state().to_account_state(true));

            machine.update(Event::AddressChanged("other@example.com".to_string()));

            let state = machine.state();
            assert_eq!(state.step, Step::Address);
            assert!(state.discovered_settings.is_none());
            assert!(state.last_error.is_none());
            assert!(!state.configuration_approved.value());
            assert!(state.is_next_action_visible);
            assert!(repository.get().is_none());
        }
    }

    mod discovery_tests {
        use super::*;

        #[test]
        fn password_settings_go_to_credentials() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(&mut machine, &request, DiscoveryOutcome::Found(password_imap()));

            let state = machine.state();
            assert_eq!(state.step, Step::Credential);
            assert!(state.is_next_action_visible);
            assert!(!state.is_loading);
            assert_eq!(state.discovered_settings, Some(password_imap()));
            assert!(machine.oauth().calls.is_empty());
        }

        #[test]
        fn oauth_settings_start_subflow() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(
                &mut machine,
                &request,
                DiscoveryOutcome::Found(imap(
                    vec![AuthenticationType::OAuth2, AuthenticationType::PasswordCleartext],
                    true,
                )),
            );

            assert_eq!(machine.state().step, Step::OAuth);
            assert!(!machine.state().is_next_action_visible);
            assert_eq!(
                machine.oauth().calls,
                vec![("imap.example.com".to_string(), "user@example.com".to_string())]
            );
        }

        #[test]
        fn placeholder_goes_to_credentials() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(
                &mut machine,
                &request,
                DiscoveryOutcome::Found(DiscoveredSettings::trusted_placeholder()),
            );
            assert_eq!(machine.state().step, Step::Credential);
            assert_eq!(machine.state().is_trusted(), Some(true));
        }

        #[test]
        fn not_found_goes_to_manual() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(&mut machine, &request, DiscoveryOutcome::NotFound);

            assert_eq!(machine.state().step, Step::Manual);
            assert!(machine.state().discovered_settings.is_none());
            assert!(!machine.state().is_loading);
        }

        #[test]
        fn errors_stay_at_address() {
            for (outcome, error) in [
                (DiscoveryOutcome::NetworkError, DiscoveryError::Network),
                (DiscoveryOutcome::UnknownError, DiscoveryError::Unknown),
            ] {
                let Fixture { mut machine, .. } = fixture();
                let request = submit(&mut machine, "user@example.com");
                resolve(&mut machine, &request, outcome);

                let state = machine.state();
                assert_eq!(state.step, Step::Address);
                assert_eq!(state.last_error, Some(error));
                assert!(!state.is_loading);
                assert_eq!(state.email_address.value(), "user@example.com");
            }
        }

        #[test]
        fn error_clears_previous_settings() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.com");
            resolve(&mut machine, &request, DiscoveryOutcome::Found(password_imap()));
            machine.update(Event::Back);

            let Command::Discover(request) = machine.update(Event::Next) else {
                panic!("expected discovery");
            };
            resolve(&mut machine, &request, DiscoveryOutcome::NetworkError);
            assert!(machine.state().discovered_settings.is_none());
            assert_eq!(machine.state().last_error, Some(DiscoveryError::Network));
        }

        #[test]
        fn retry_rediscovers_same_address() {
            let Fixture { mut machine, .. } = fixture();
            let first = submit(&mut machine, "user@example.com");
            resolve(&mut machine, &first, DiscoveryOutcome::NetworkError);

            let Command::Discover(second) = machine.update(Event::Retry) else {
                panic!("expected discovery");
            };
            assert!(machine.state().last_error.is_none());
            assert!(machine.state().is_loading);
            assert_eq!(second.email_address, first.email_address);
            assert_ne!(second.ticket, first.ticket);
        }

        #[test]
        fn superseded_result_is_ignored() {
            let Fixture { mut machine, .. } = fixture();
            let stale = submit(&mut machine, "old@example.com");
            machine.update(Event::AddressChanged("new@example.com".to_string()));
            assert!(!machine.state().is_loading);

            resolve(&mut machine, &stale, DiscoveryOutcome::Found(password_imap()));
            let state = machine.state();
            assert_eq!(state.step, Step::Address);
            assert!(state.discovered_settings.is_none());
            assert_eq!(state.email_address.value(), "new@example.com");
        }

        #[test]
        fn stale_result_does_not_end_current_request() {
            let Fixture { mut machine, .. } = fixture();
            let stale = submit(&mut machine, "user@example.com");
            let current = submit(&mut machine, "user@example.com");

            resolve(&mut machine, &stale, DiscoveryOutcome::NotFound);
            assert!(machine.state().is_loading);
            assert_eq!(machine.state().step, Step::Address);

            resolve(&mut machine, &current, DiscoveryOutcome::Found(password_imap()));
            assert_eq!(machine.state().step, Step::Credential);
        }
    }

    mod credential_step_tests {
        use super::*;

        fn at_credentials(settings: DiscoveredSettings) -> Fixture {
            let mut fixture = fixture();
            let request = submit(&mut fixture.machine, "user@example.com");
            resolve(
                &mut fixture.machine,
                &request,
                DiscoveryOutcome::Found(settings),
            );
            assert_eq!(fixture.machine.state().step, Step::Credential);
            fixture
        }

        #[test]
        fn missing_password_blocks() {
            let Fixture { mut machine, .. } = at_credentials(password_imap());
            assert_eq!(machine.update(Event::Next), Command::None);
            assert_eq!(
                machine.state().password.error(),
                Some(&ValidationError::EmptyPassword)
            );
        }

        #[test]
        fn untrusted_settings_need_approval() {
            let Fixture { mut machine, .. } =
                at_credentials(imap(vec![AuthenticationType::PasswordCleartext], false));
            machine.update(Event::PasswordChanged("secret".to_string()));

            assert_eq!(machine.update(Event::Next), Command::None);
            assert_eq!(
                machine.state().configuration_approved.error(),
                Some(&ValidationError::ApprovalRequired)
            );

            machine.update(Event::ApprovalChanged(true));
            assert!(machine.state().configuration_approved.error().is_none());
            assert!(matches!(
                machine.update(Event::Next),
                Command::Emit(Effect::NavigateNext { .. })
            ));
        }

        #[test]
        fn invalid_address_at_credentials_redisplays_error() {
            let Fixture { mut machine, .. } = at_credentials(password_imap());
            // Bypass AddressChanged to simulate an address that no longer validates
            let mut state = machine.state().clone();
            state.email_address = InputField::new("broken".to_string());
            let mut machine = OnboardingStateMachine::with_state(
                state,
                Box::new(DefaultValidator),
                Arc::new(InMemoryAccountStateRepository::new()),
                RecordingOAuth::default(),
            );
            machine.update(Event::PasswordChanged("secret".to_string()));

            assert_eq!(machine.update(Event::Next), Command::None);
            assert_eq!(
                machine.state().email_address.error(),
                Some(&ValidationError::InvalidEmail)
            );
            assert!(!machine.state().is_loading);
        }

        #[test]
        fn valid_credentials_complete() {
            let Fixture {
                mut machine,
                repository,
            } = at_credentials(password_imap());
            machine.update(Event::PasswordChanged("secret".to_string()));

            assert_eq!(
                machine.update(Event::Next),
                Command::Emit(Effect::NavigateNext {
                    is_automatic_config: true,
                    incoming_protocol_type: Some(IncomingProtocolType::Imap),
                })
            );

            let snapshot = repository.get().unwrap();
            assert_eq!(snapshot.email_address, "user@example.com");
            assert_eq!(snapshot.password.as_deref(), Some("secret"));
            assert!(snapshot.is_automatic_config);
            assert_eq!(snapshot.discovered_settings, Some(password_imap()));
        }

        #[test]
        fn placeholder_completes_with_unknown_protocol() {
            let Fixture { mut machine, .. } =
                at_credentials(DiscoveredSettings::trusted_placeholder());
            machine.update(Event::PasswordChanged("secret".to_string()));
            assert_eq!(
                machine.update(Event::Next),
                Command::Emit(Effect::NavigateNext {
                    is_automatic_config: true,
                    incoming_protocol_type: None,
                })
            );
        }

        #[test]
        fn retry_is_ignored() {
            let Fixture { mut machine, .. } = at_credentials(password_imap());
            assert_eq!(machine.update(Event::Retry), Command::None);
            assert_eq!(machine.state().step, Step::Credential);
            assert!(!machine.state().is_loading);
        }

        #[test]
        fn back_clears_password() {
            let Fixture { mut machine, .. } = at_credentials(password_imap());
            machine.update(Event::PasswordChanged("secret".to_string()));

            assert_eq!(machine.update(Event::Back), Command::None);
            assert_eq!(machine.state().step, Step::Address);
            assert!(machine.state().password.value().is_empty());
            assert!(machine.state().is_next_action_visible);
        }

        #[test]
        fn back_then_next_reproduces_outcome() {
            let Fixture { mut machine, .. } = at_credentials(password_imap());
            machine.update(Event::Back);

            let Command::Discover(request) = machine.update(Event::Next) else {
                panic!("expected discovery");
            };
            resolve(&mut machine, &request, DiscoveryOutcome::Found(password_imap()));
            assert_eq!(machine.state().step, Step::Credential);
            assert_eq!(machine.state().discovered_settings, Some(password_imap()));
        }

        #[test]
        fn edit_configuration_is_manual() {
            let Fixture { mut machine, .. } = at_credentials(password_imap());
            assert_eq!(
                machine.update(Event::EditConfigurationClicked),
                Command::Emit(Effect::NavigateNext {
                    is_automatic_config: false,
                    incoming_protocol_type: Some(IncomingProtocolType::Imap),
                })
            );
        }
    }

    mod oauth_step_tests {
        use super::*;

        fn at_oauth() -> Fixture {
            let mut fixture = fixture();
            let request = submit(&mut fixture.machine, "user@example.com");
            resolve(
                &mut fixture.machine,
                &request,
                DiscoveryOutcome::Found(imap(vec![AuthenticationType::OAuth2], true)),
            );
            assert_eq!(fixture.machine.state().step, Step::OAuth);
            fixture
        }

        #[test]
        fn next_is_noop() {
            let Fixture { mut machine, .. } = at_oauth();
            assert_eq!(machine.update(Event::Next), Command::None);
            assert_eq!(machine.state().step, Step::OAuth);
        }

        #[test]
        fn success_completes_automatically() {
            let Fixture {
                mut machine,
                repository,
            } = at_oauth();
            let command = machine.update(Event::OAuthResult(OAuthResult::Success(Token::bearer(
                "access",
            ))));

            assert_eq!(
                command,
                Command::Emit(Effect::NavigateNext {
                    is_automatic_config: true,
                    incoming_protocol_type: Some(IncomingProtocolType::Imap),
                })
            );
            assert_eq!(
                repository.get().unwrap().authorization_token,
                Some(Token::bearer("access"))
            );
        }

        #[test]
        fn expired_token_does_not_complete() {
            let Fixture {
                mut machine,
                repository,
            } = at_oauth();
            let expired = Token::from_response(TokenResponse {
                access_token: "access".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: Some(0),
                refresh_token: None,
            });

            let command = machine.update(Event::OAuthResult(OAuthResult::Success(expired)));
            assert_eq!(command, Command::None);
            assert_eq!(machine.state().step, Step::OAuth);
            assert!(machine.state().authorization_token.is_none());
            assert!(repository.get().is_none());
        }

        #[test]
        fn failure_stays_and_clears_token() {
            let Fixture { mut machine, .. } = at_oauth();
            let command =
                machine.update(Event::OAuthResult(OAuthResult::Failure("denied".to_string())));
            assert_eq!(command, Command::None);
            assert_eq!(machine.state().step, Step::OAuth);
            assert!(machine.state().authorization_token.is_none());

            assert_eq!(
                machine.update(Event::OAuthResult(OAuthResult::Canceled)),
                Command::None
            );
            assert_eq!(machine.state().step, Step::OAuth);
        }

        #[test]
        fn back_returns_to_address() {
            let Fixture { mut machine, .. } = at_oauth();
            machine.update(Event::Back);
            assert_eq!(machine.state().step, Step::Address);
            assert!(machine.state().is_next_action_visible);
        }

        #[test]
        fn late_result_after_back_is_ignored() {
            let Fixture { mut machine, .. } = at_oauth();
            machine.update(Event::Back);
            let command = machine.update(Event::OAuthResult(OAuthResult::Success(Token::bearer(
                "late",
            ))));
            assert_eq!(command, Command::None);
            assert!(machine.state().authorization_token.is_none());
        }

        #[test]
        fn edit_configuration_from_oauth() {
            let Fixture { mut machine, .. } = at_oauth();
            assert!(matches!(
                machine.update(Event::EditConfigurationClicked),
                Command::Emit(Effect::NavigateNext {
                    is_automatic_config: false,
                    ..
                })
            ));
        }
    }

    mod manual_step_tests {
        use super::*;

        #[test]
        fn next_completes_manually() {
            let Fixture {
                mut machine,
                repository,
            } = fixture();
            let request = submit(&mut machine, "user@example.org");
            resolve(&mut machine, &request, DiscoveryOutcome::NotFound);

            assert_eq!(
                machine.update(Event::Next),
                Command::Emit(Effect::NavigateNext {
                    is_automatic_config: false,
                    incoming_protocol_type: None,
                })
            );
            assert!(!repository.get().unwrap().is_automatic_config);
        }

        #[test]
        fn edit_configuration_needs_settings() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.org");
            resolve(&mut machine, &request, DiscoveryOutcome::NotFound);
            assert_eq!(
                machine.update(Event::EditConfigurationClicked),
                Command::None
            );
        }

        #[test]
        fn back_returns_to_address() {
            let Fixture { mut machine, .. } = fixture();
            let request = submit(&mut machine, "user@example.org");
            resolve(&mut machine, &request, DiscoveryOutcome::NotFound);
            machine.update(Event::Back);
            assert_eq!(machine.state().step, Step::Address);
        }
    }
}
