//! Generic probe over a full autodiscovery service.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::{DiscoveryOutcome, DiscoveryProbe};
use crate::Error;
use crate::settings::DiscoveredSettings;

/// Default bound on one autodiscovery run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Verdict of an autodiscovery service.
#[derive(Debug)]
pub enum AutoDiscoveryResult {
    /// The service ran to completion but found nothing usable.
    NoUsableSettingsFound,
    /// The service found settings.
    Settings(DiscoveredSettings),
    /// A network failure stopped the service.
    NetworkError(Error),
    /// Anything else that went wrong.
    UnexpectedError(Error),
}

/// An autodiscovery implementation (ISP autoconfig, ISPDB, provider tables).
pub trait AutoDiscoveryService: Send + Sync {
    /// Discover settings for `email_address`.
    fn execute(&self, email_address: &str) -> impl Future<Output = AutoDiscoveryResult> + Send;
}

/// Probe that delegates to an [`AutoDiscoveryService`].
#[derive(Debug, Clone)]
pub struct AutoDiscoveryProbe<S> {
    service: S,
    timeout: Duration,
}

impl<S: AutoDiscoveryService> AutoDiscoveryProbe<S> {
    /// Wrap `service`.
    pub const fn new(service: S) -> Self {
        Self {
            service,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound each run by `timeout`; exceeding it counts as a network error.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<S: AutoDiscoveryService> DiscoveryProbe for AutoDiscoveryProbe<S> {
    async fn attempt(&self, email_address: &str) -> DiscoveryOutcome {
        let Ok(result) =
            tokio::time::timeout(self.timeout, self.service.execute(email_address)).await
        else {
            warn!("Autodiscovery timed out after {:?}", self.timeout);
            return DiscoveryOutcome::NetworkError;
        };

        match result {
            AutoDiscoveryResult::Settings(settings) => DiscoveryOutcome::Found(settings),
            AutoDiscoveryResult::NoUsableSettingsFound => {
                debug!("Autodiscovery found no usable settings");
                DiscoveryOutcome::NotFound
            }
            AutoDiscoveryResult::NetworkError(e) => {
                warn!("Autodiscovery network error: {e}");
                DiscoveryOutcome::NetworkError
            }
            AutoDiscoveryResult::UnexpectedError(e) => {
                warn!("Autodiscovery failed: {e}");
                DiscoveryOutcome::UnknownError
            }
        }
    }
}
