//! Async driver running the state machine's discovery commands.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::event::{Command, DiscoveryRequest, Effect, Event};
use super::machine::OnboardingStateMachine;
use super::oauth::OAuthSubflow;
use super::state::WizardState;
use crate::discovery::{DiscoveryCoordinator, DiscoveryOutcome, DiscoveryProbe};

/// Couples a state machine with a discovery coordinator.
///
/// Discovery runs on spawned tasks; finished requests come back over a
/// channel and are applied by [`settle`](Self::settle). Results superseded
/// in the meantime are dropped by the machine.
pub struct OnboardingSession<F, G, O> {
    machine: OnboardingStateMachine<O>,
    coordinator: Arc<DiscoveryCoordinator<F, G>>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl<F, G, O> OnboardingSession<F, G, O>
where
    F: DiscoveryProbe + 'static,
    G: DiscoveryProbe + 'static,
    O: OAuthSubflow,
{
    /// Create a session.
    pub fn new(
        machine: OnboardingStateMachine<O>,
        coordinator: Arc<DiscoveryCoordinator<F, G>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            machine,
            coordinator,
            events_tx,
            events_rx,
        }
    }

    /// Current wizard state.
    #[must_use]
    pub const fn state(&self) -> &WizardState {
        self.machine.state()
    }

    /// The underlying state machine.
    #[must_use]
    pub const fn machine(&self) -> &OnboardingStateMachine<O> {
        &self.machine
    }

    /// The underlying state machine, mutably.
    pub const fn machine_mut(&mut self) -> &mut OnboardingStateMachine<O> {
        &mut self.machine
    }

    /// Apply an event, starting discovery if the machine asks for it.
    ///
    /// Must be called within a Tokio runtime.
    pub fn handle(&mut self, event: Event) -> Option<Effect> {
        match self.machine.update(event) {
            Command::None => None,
            Command::Emit(effect) => Some(effect),
            Command::Discover(request) => {
                self.spawn_discovery(request);
                None
            }
        }
    }

    /// Wait until no discovery is in flight, applying results as they arrive.
    pub async fn settle(&mut self) -> Option<Effect> {
        while self.machine.state().is_loading {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            if let Some(effect) = self.handle(event) {
                return Some(effect);
            }
        }
        None
    }

    fn spawn_discovery(&self, request: DiscoveryRequest) {
        let coordinator = Arc::clone(&self.coordinator);
        let events_tx = self.events_tx.clone();
        let DiscoveryRequest {
            ticket,
            email_address,
        } = request;

        let discovery = tokio::spawn(async move { coordinator.discover(&email_address).await });

        tokio::spawn(async move {
            let outcome = match discovery.await {
                Ok(outcome) => {
                    debug!("Discovery {} finished", ticket.0);
                    outcome
                }
                Err(e) => {
                    warn!("Discovery {} aborted: {e}", ticket.0);
                    DiscoveryOutcome::UnknownError
                }
            };

            if events_tx
                .send(Event::DiscoveryCompleted { ticket, outcome })
                .is_err()
            {
                warn!("Session closed before discovery {} finished", ticket.0);
            }
        });
    }
}

impl<F, G, O> std::fmt::Debug for OnboardingSession<F, G, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingSession")
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}
