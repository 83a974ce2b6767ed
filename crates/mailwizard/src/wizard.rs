//! Interactive terminal front end for an onboarding session.

use anyhow::{Result, bail};
use mailwizard_core::{
    DiscoveryProbe, Effect, Event, IncomingServerSettings, OnboardingSession, ServerSettings, Step,
    WizardState,
};
use mailwizard_oauth::{OAuthResult, OAuthSession, SessionState};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

/// Prompts for each step and feeds the answers to the session.
pub struct Wizard<F, G, R, W> {
    session: OnboardingSession<F, G, OAuthSession>,
    input: Lines<R>,
    output: W,
}

impl<F, G, R, W> Wizard<F, G, R, W>
where
    F: DiscoveryProbe + 'static,
    G: DiscoveryProbe + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(session: OnboardingSession<F, G, OAuthSession>, input: R, output: W) -> Self {
        Self {
            session,
            input: input.lines(),
            output,
        }
    }

    /// Run until the wizard emits a navigation effect.
    pub async fn run(&mut self) -> Result<Effect> {
        loop {
            let step = self.session.state().step;
            debug!("Prompting for {step:?}");

            let effect = match step {
                Step::Address => self.address_step().await?,
                Step::Credential => self.credential_step().await?,
                Step::OAuth => self.oauth_step().await?,
                Step::Manual => self.manual_step().await?,
            };
            if let Some(effect) = effect {
                return Ok(effect);
            }
        }
    }

    async fn address_step(&mut self) -> Result<Option<Effect>> {
        let last_error = self.session.state().last_error;
        if let Some(error) = last_error {
            self.say(&error.to_string()).await?;
            let answer = self
                .ask("[r]etry, [s]kip to manual entry or [b]ack")
                .await?;
            let event = match answer.as_str() {
                "r" | "retry" => Event::Retry,
                "s" | "skip" => Event::Next,
                _ => Event::Back,
            };
            return self.dispatch(event).await;
        }

        let address = self.ask("Email address (empty to quit)").await?;
        if address.is_empty() {
            return self.dispatch(Event::Back).await;
        }

        self.session.handle(Event::AddressChanged(address));
        self.say("Looking up server settings...").await?;
        let effect = self.dispatch(Event::Next).await?;
        self.report_field_errors().await?;
        Ok(effect)
    }

    async fn credential_step(&mut self) -> Result<Option<Effect>> {
        let state = self.session.state();
        let summary = describe(state);
        let needs_approval =
            state.is_trusted() == Some(false) && !state.configuration_approved.value();
        self.say(&summary).await?;

        if needs_approval {
            let answer = self
                .ask("These settings come from an unverified source. Use them? [y/N]")
                .await?;
            self.session.handle(Event::ApprovalChanged(is_yes(&answer)));
        }

        let answer = self.ask("Password (/back, /edit)").await?;
        let effect = match answer.as_str() {
            "/back" => self.dispatch(Event::Back).await?,
            "/edit" => self.dispatch(Event::EditConfigurationClicked).await?,
            _ => {
                self.session.handle(Event::PasswordChanged(answer));
                self.dispatch(Event::Next).await?
            }
        };
        self.report_field_errors().await?;
        Ok(effect)
    }

    async fn oauth_step(&mut self) -> Result<Option<Effect>> {
        let status = match self.session.machine().oauth().state() {
            SessionState::AwaitingAuthorization { provider, url } => {
                format!("Sign in with {}:\n\n{url}\n", provider.display_name())
            }
            SessionState::Failed(reason) => format!("Authorization unavailable: {reason}"),
            SessionState::Idle | SessionState::Authorized => String::new(),
        };
        if !status.is_empty() {
            self.say(&status).await?;
        }

        let answer = self
            .ask("Paste the redirect URL (/back, /cancel, /edit)")
            .await?;
        match answer.as_str() {
            "/back" => self.dispatch(Event::Back).await,
            "/edit" => self.dispatch(Event::EditConfigurationClicked).await,
            "/cancel" => {
                let result = self.session.machine_mut().oauth_mut().cancel();
                self.dispatch(Event::OAuthResult(result)).await
            }
            redirect => {
                let result = self
                    .session
                    .machine_mut()
                    .oauth_mut()
                    .complete_redirect(redirect)
                    .await;
                if let OAuthResult::Failure(reason) = &result {
                    self.say(&format!("Authorization failed: {reason}")).await?;
                }
                self.dispatch(Event::OAuthResult(result)).await
            }
        }
    }

    async fn manual_step(&mut self) -> Result<Option<Effect>> {
        self.say("No settings were found for this address.").await?;
        let answer = self.ask("Continue with manual setup? [Y/n]").await?;
        let event = if answer.eq_ignore_ascii_case("n") {
            Event::Back
        } else {
            Event::Next
        };
        self.dispatch(event).await
    }

    async fn dispatch(&mut self, event: Event) -> Result<Option<Effect>> {
        if let Some(effect) = self.session.handle(event) {
            return Ok(Some(effect));
        }
        Ok(self.session.settle().await)
    }

    async fn report_field_errors(&mut self) -> Result<()> {
        let state = self.session.state();
        let messages: Vec<&'static str> = [
            state.email_address.error(),
            state.password.error(),
            state.configuration_approved.error(),
        ]
        .into_iter()
        .flatten()
        .map(|error| error.message())
        .collect();

        for message in messages {
            self.say(message).await?;
        }
        Ok(())
    }

    async fn say(&mut self, line: &str) -> Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn ask(&mut self, label: &str) -> Result<String> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.write_all(b": ").await?;
        self.output.flush().await?;

        match self.input.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => bail!("input closed before setup finished"),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

fn describe(state: &WizardState) -> String {
    let Some(settings) = &state.discovered_settings else {
        return "Continuing without discovered settings.".to_string();
    };

    match &settings.incoming {
        IncomingServerSettings::Imap(server) => describe_server("IMAP", server),
        IncomingServerSettings::Pop3(server) => describe_server("POP3", server),
        IncomingServerSettings::Placeholder => {
            "Provider recognized; server details will be completed later.".to_string()
        }
    }
}

fn describe_server(protocol: &str, server: &ServerSettings) -> String {
    format!(
        "Found {protocol} server {}:{} ({})",
        server.hostname,
        server.port,
        server.security.display_name()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use mailwizard_core::discovery::{AutoDiscoveryProbe, KnownProviderDiscovery};
    use mailwizard_core::{
        AuthenticationType, ConnectionSecurity, DefaultValidator, DiscoveredSettings,
        DiscoveryCoordinator, DiscoveryOutcome, InMemoryAccountStateRepository,
        IncomingProtocolType, OnboardingStateMachine, ValidationError,
    };
    use mailwizard_oauth::ClientConfig;

    use super::*;

    #[derive(Clone)]
    struct FixedProbe(DiscoveryOutcome);

    impl DiscoveryProbe for FixedProbe {
        async fn attempt(&self, _email_address: &str) -> DiscoveryOutcome {
            self.0.clone()
        }
    }

    fn session<G: DiscoveryProbe + 'static>(
        generic: G,
    ) -> (
        OnboardingSession<FixedProbe, G, OAuthSession>,
        Arc<InMemoryAccountStateRepository>,
    ) {
        let repository = Arc::new(InMemoryAccountStateRepository::new());
        let machine = OnboardingStateMachine::new(
            Box::new(DefaultValidator),
            repository.clone(),
            OAuthSession::new(ClientConfig::default()).unwrap(),
        );
        let coordinator = Arc::new(DiscoveryCoordinator::new(
            FixedProbe(DiscoveryOutcome::NotFound),
            generic,
        ));
        (OnboardingSession::new(machine, coordinator), repository)
    }

    async fn run<G: DiscoveryProbe + 'static>(generic: G, input: &str) -> (Result<Effect>, String) {
        let (session, _) = session(generic);
        let mut output = Vec::new();
        let result = Wizard::new(session, input.as_bytes(), &mut output)
            .run()
            .await;
        (result, String::from_utf8(output).unwrap())
    }

    fn untrusted_imap() -> DiscoveredSettings {
        DiscoveredSettings {
            incoming: IncomingServerSettings::Imap(ServerSettings {
                hostname: "imap.example.com".to_string(),
                port: 993,
                security: ConnectionSecurity::Tls,
                username: "user@example.com".to_string(),
                authentication_types: vec![AuthenticationType::PasswordCleartext],
            }),
            outgoing: None,
            is_trusted: false,
        }
    }

    #[tokio::test]
    async fn empty_address_quits() {
        let (effect, _) = run(FixedProbe(DiscoveryOutcome::NotFound), "\n").await;
        assert_eq!(effect.unwrap(), Effect::NavigateBack);
    }

    #[tokio::test]
    async fn invalid_address_is_reported() {
        let (effect, output) =
            run(FixedProbe(DiscoveryOutcome::NotFound), "not-an-address\n\n").await;
        assert_eq!(effect.unwrap(), Effect::NavigateBack);
        assert!(output.contains(ValidationError::InvalidEmail.message()));
    }

    #[tokio::test]
    async fn manual_setup() {
        let (effect, output) =
            run(FixedProbe(DiscoveryOutcome::NotFound), "user@unknown.example\n\n").await;
        assert_eq!(
            effect.unwrap(),
            Effect::NavigateNext {
                is_automatic_config: false,
                incoming_protocol_type: None,
            }
        );
        assert!(output.contains("No settings were found"));
    }

    #[tokio::test]
    async fn untrusted_settings_with_approval() {
        let (effect, output) = run(
            FixedProbe(DiscoveryOutcome::Found(untrusted_imap())),
            "user@example.com\ny\nsecret\n",
        )
        .await;
        assert_eq!(
            effect.unwrap(),
            Effect::NavigateNext {
                is_automatic_config: true,
                incoming_protocol_type: Some(IncomingProtocolType::Imap),
            }
        );
        assert!(output.contains("Found IMAP server imap.example.com:993 (SSL/TLS)"));
    }

    #[tokio::test]
    async fn declined_approval_asks_again() {
        let (effect, output) = run(
            FixedProbe(DiscoveryOutcome::Found(untrusted_imap())),
            "user@example.com\nn\nsecret\ny\nsecret\n",
        )
        .await;
        assert!(matches!(effect.unwrap(), Effect::NavigateNext { .. }));
        assert!(output.contains(ValidationError::ApprovalRequired.message()));
    }

    #[tokio::test]
    async fn network_error_then_skip() {
        let (effect, output) = run(
            FixedProbe(DiscoveryOutcome::NetworkError),
            "user@example.com\ns\nsecret\n",
        )
        .await;
        assert!(output.contains("Could not reach the server"));
        assert_eq!(
            effect.unwrap(),
            Effect::NavigateNext {
                is_automatic_config: false,
                incoming_protocol_type: None,
            }
        );
    }

    #[tokio::test]
    async fn oauth_without_client_id_can_go_back() {
        let (effect, output) = run(
            AutoDiscoveryProbe::new(KnownProviderDiscovery::new()),
            "someone@gmail.com\n/back\n\n",
        )
        .await;
        assert_eq!(effect.unwrap(), Effect::NavigateBack);
        assert!(output.contains("Authorization unavailable"));
    }

    #[tokio::test]
    async fn denied_consent_stays_at_oauth() {
        let (effect, output) = run(
            AutoDiscoveryProbe::new(KnownProviderDiscovery::new()),
            "someone@gmail.com\nhttp://localhost:8080/?error=access_denied&state=x\n/back\n\n",
        )
        .await;
        assert_eq!(effect.unwrap(), Effect::NavigateBack);
        assert!(output.contains("Authorization failed"));
    }

    #[tokio::test]
    async fn closed_input_is_an_error() {
        let (effect, _) = run(FixedProbe(DiscoveryOutcome::NotFound), "").await;
        assert!(effect.is_err());
    }
}
