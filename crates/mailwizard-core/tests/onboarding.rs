//! End-to-end onboarding through the async session with fake probes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailwizard_core::discovery::{AutoDiscoveryProbe, KnownProviderDiscovery};
use mailwizard_core::{
    AuthenticationType, ConnectionSecurity, DefaultValidator, DiscoveredSettings,
    DiscoveryCoordinator, DiscoveryError, DiscoveryOutcome, DiscoveryProbe, Effect, Event,
    InMemoryAccountStateRepository, IncomingProtocolType, IncomingServerSettings, OAuthSubflow,
    OnboardingSession, OnboardingStateMachine, ServerSettings, Step,
};
use mailwizard_oauth::{OAuthResult, Token};

/// Probe answering from a table, optionally after a per-address delay.
#[derive(Clone, Default)]
struct ScriptedProbe {
    outcomes: HashMap<String, DiscoveryOutcome>,
    delays: HashMap<String, Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProbe {
    fn with(mut self, address: &str, outcome: DiscoveryOutcome) -> Self {
        self.outcomes.insert(address.to_string(), outcome);
        self
    }

    fn delayed(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DiscoveryProbe for ScriptedProbe {
    async fn attempt(&self, email_address: &str) -> DiscoveryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(email_address) {
            tokio::time::sleep(*delay).await;
        }
        self.outcomes
            .get(email_address)
            .cloned()
            .unwrap_or(DiscoveryOutcome::NotFound)
    }
}

#[derive(Clone, Default)]
struct RecordingOAuth {
    calls: Arc<Mutex<Vec<String>>>,
}

impl OAuthSubflow for RecordingOAuth {
    fn init_state(&mut self, hostname: &str, _email_address: &str) {
        self.calls.lock().unwrap().push(hostname.to_string());
    }
}

/// Generic probe whose task dies mid-discovery.
#[derive(Clone, Copy)]
struct PanickingProbe;

impl DiscoveryProbe for PanickingProbe {
    async fn attempt(&self, _email_address: &str) -> DiscoveryOutcome {
        panic!("autodiscovery backend crashed");
    }
}

type Session<G> = OnboardingSession<ScriptedProbe, G, RecordingOAuth>;

fn session<G: DiscoveryProbe + 'static>(
    fast: ScriptedProbe,
    generic: G,
) -> (Session<G>, Arc<InMemoryAccountStateRepository>) {
    let repository = Arc::new(InMemoryAccountStateRepository::new());
    let machine = OnboardingStateMachine::new(
        Box::new(DefaultValidator),
        repository.clone(),
        RecordingOAuth::default(),
    );
    let coordinator = Arc::new(DiscoveryCoordinator::new(fast, generic));
    (OnboardingSession::new(machine, coordinator), repository)
}

fn imap_settings(authentication_types: Vec<AuthenticationType>) -> DiscoveredSettings {
    DiscoveredSettings {
        incoming: IncomingServerSettings::Imap(ServerSettings {
            hostname: "imap.example.com".to_string(),
            port: 993,
            security: ConnectionSecurity::Tls,
            username: "user@example.com".to_string(),
            authentication_types,
        }),
        outgoing: None,
        is_trusted: false,
    }
}

async fn submit<G: DiscoveryProbe + 'static>(session: &mut Session<G>, address: &str) {
    assert!(session.handle(Event::AddressChanged(address.to_string())).is_none());
    assert!(session.handle(Event::Next).is_none());
    assert!(session.state().is_loading);
    assert!(session.settle().await.is_none());
}

#[tokio::test]
async fn fast_probe_match_skips_autodiscovery() {
    let fast = ScriptedProbe::default().with(
        "user@corp.example",
        DiscoveryOutcome::Found(DiscoveredSettings::trusted_placeholder()),
    );
    let generic = ScriptedProbe::default();
    let (mut session, repository) = session(fast.clone(), generic.clone());

    submit(&mut session, "user@corp.example").await;
    assert_eq!(session.state().step, Step::Credential);
    assert_eq!(generic.calls(), 0);

    session.handle(Event::PasswordChanged("secret".to_string()));
    assert_eq!(
        session.handle(Event::Next),
        Some(Effect::NavigateNext {
            is_automatic_config: true,
            incoming_protocol_type: None,
        })
    );
    assert!(repository.get().unwrap().is_automatic_config);
}

#[tokio::test]
async fn untrusted_generic_settings_need_approval() {
    let generic = ScriptedProbe::default().with(
        "user@example.com",
        DiscoveryOutcome::Found(imap_settings(vec![AuthenticationType::PasswordCleartext])),
    );
    let (mut session, repository) = session(ScriptedProbe::default(), generic);

    submit(&mut session, "user@example.com").await;
    assert_eq!(session.state().step, Step::Credential);

    session.handle(Event::PasswordChanged("secret".to_string()));
    assert!(session.handle(Event::Next).is_none());
    assert!(repository.get().is_none());

    session.handle(Event::ApprovalChanged(true));
    assert_eq!(
        session.handle(Event::Next),
        Some(Effect::NavigateNext {
            is_automatic_config: true,
            incoming_protocol_type: Some(IncomingProtocolType::Imap),
        })
    );
}

#[tokio::test]
async fn oauth_settings_wait_for_subflow() {
    let generic = ScriptedProbe::default().with(
        "user@example.com",
        DiscoveryOutcome::Found(imap_settings(vec![AuthenticationType::OAuth2])),
    );
    let (mut session, repository) = session(ScriptedProbe::default(), generic);

    submit(&mut session, "user@example.com").await;
    assert_eq!(session.state().step, Step::OAuth);
    assert!(!session.state().is_next_action_visible);
    assert_eq!(
        *session.machine().oauth().calls.lock().unwrap(),
        vec!["imap.example.com".to_string()]
    );

    assert!(
        session
            .handle(Event::OAuthResult(OAuthResult::Failure("denied".into())))
            .is_none()
    );
    assert_eq!(session.state().step, Step::OAuth);

    let effect = session.handle(Event::OAuthResult(OAuthResult::Success(Token::bearer("t"))));
    assert_eq!(
        effect,
        Some(Effect::NavigateNext {
            is_automatic_config: true,
            incoming_protocol_type: Some(IncomingProtocolType::Imap),
        })
    );
    assert!(repository.get().unwrap().authorization_token.is_some());
}

#[tokio::test]
async fn nothing_found_goes_to_manual() {
    let (mut session, repository) = session(ScriptedProbe::default(), ScriptedProbe::default());

    submit(&mut session, "user@unknown.example").await;
    assert_eq!(session.state().step, Step::Manual);
    assert_eq!(
        session.handle(Event::Next),
        Some(Effect::NavigateNext {
            is_automatic_config: false,
            incoming_protocol_type: None,
        })
    );
    let snapshot = repository.get().unwrap();
    assert_eq!(snapshot.email_address, "user@unknown.example");
    assert!(snapshot.discovered_settings.is_none());
}

#[tokio::test]
async fn network_error_offers_retry() {
    let generic =
        ScriptedProbe::default().with("user@example.com", DiscoveryOutcome::NetworkError);
    let (mut session, _) = session(ScriptedProbe::default(), generic.clone());

    submit(&mut session, "user@example.com").await;
    assert_eq!(session.state().step, Step::Address);
    assert_eq!(session.state().last_error, Some(DiscoveryError::Network));

    assert!(session.handle(Event::Retry).is_none());
    assert!(session.state().last_error.is_none());
    assert!(session.settle().await.is_none());
    assert_eq!(generic.calls(), 2);
    assert_eq!(session.state().last_error, Some(DiscoveryError::Network));

    // Next after an error skips discovery
    assert!(session.handle(Event::Next).is_none());
    assert_eq!(session.state().step, Step::Credential);
    assert!(!session.state().is_loading);
}

#[tokio::test(start_paused = true)]
async fn newer_address_supersedes_slow_discovery() {
    let generic = ScriptedProbe::default()
        .with(
            "old@example.com",
            DiscoveryOutcome::Found(imap_settings(vec![AuthenticationType::OAuth2])),
        )
        .delayed("old@example.com", Duration::from_secs(30));
    let (mut session, _) = session(ScriptedProbe::default(), generic);

    session.handle(Event::AddressChanged("old@example.com".to_string()));
    session.handle(Event::Next);
    assert!(session.state().is_loading);

    // The user edits the address before the slow lookup finishes
    session.handle(Event::AddressChanged("new@example.com".to_string()));
    assert!(!session.state().is_loading);
    session.handle(Event::Next);
    assert!(session.settle().await.is_none());
    assert_eq!(session.state().step, Step::Manual);

    tokio::time::sleep(Duration::from_secs(60)).await;
    session.handle(Event::Back);
    session.handle(Event::AddressChanged("new@example.com".to_string()));
    session.handle(Event::Next);
    assert!(session.settle().await.is_none());

    // The stale OAuth settings for the old address never applied
    assert_eq!(session.state().step, Step::Manual);
    assert!(session.machine().oauth().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn back_and_next_repeat_discovery() {
    let generic = ScriptedProbe::default().with(
        "user@example.com",
        DiscoveryOutcome::Found(imap_settings(vec![AuthenticationType::PasswordCleartext])),
    );
    let (mut session, _) = session(ScriptedProbe::default(), generic.clone());

    submit(&mut session, "user@example.com").await;
    let first = session.state().discovered_settings.clone();

    session.handle(Event::PasswordChanged("secret".to_string()));
    session.handle(Event::Back);
    assert_eq!(session.state().step, Step::Address);
    assert!(session.state().password.value().is_empty());

    session.handle(Event::Next);
    assert!(session.settle().await.is_none());
    assert_eq!(session.state().step, Step::Credential);
    assert_eq!(session.state().discovered_settings, first);
    assert_eq!(generic.calls(), 2);
}

#[tokio::test]
async fn known_provider_through_autodiscovery() {
    let generic = AutoDiscoveryProbe::new(KnownProviderDiscovery::new());
    let (mut session, _) = session(ScriptedProbe::default(), generic);

    submit(&mut session, "someone@gmail.com").await;
    assert_eq!(session.state().step, Step::OAuth);
    assert_eq!(
        *session.machine().oauth().calls.lock().unwrap(),
        vec!["imap.gmail.com".to_string()]
    );

    session.handle(Event::Back);
    submit(&mut session, "someone@icloud.com").await;
    assert_eq!(session.state().step, Step::Credential);
    assert_eq!(session.state().is_trusted(), Some(true));
}

#[tokio::test]
async fn crashed_discovery_reports_unknown_error() {
    let (mut session, _) = session(ScriptedProbe::default(), PanickingProbe);

    session.handle(Event::AddressChanged("user@example.com".to_string()));
    session.handle(Event::Next);
    assert!(session.state().is_loading);

    let settled = tokio::time::timeout(Duration::from_secs(5), session.settle())
        .await
        .expect("settle hung after a crashed discovery");
    assert!(settled.is_none());
    assert!(!session.state().is_loading);
    assert_eq!(session.state().step, Step::Address);
    assert_eq!(session.state().last_error, Some(DiscoveryError::Unknown));
}
