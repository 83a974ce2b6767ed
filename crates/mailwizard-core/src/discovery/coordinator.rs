//! Priority-ordered fallback between the two probes.

use tracing::debug;

use super::{DiscoveryOutcome, DiscoveryProbe};

/// Runs the fast probe, then the generic probe only if the fast one declined.
///
/// This is a sequential fallback, not a race: a provider match skips the
/// generic service entirely, and the resolving probe's outcome is returned
/// as is.
#[derive(Debug, Clone)]
pub struct DiscoveryCoordinator<F, G> {
    fast: F,
    generic: G,
}

impl<F: DiscoveryProbe, G: DiscoveryProbe> DiscoveryCoordinator<F, G> {
    /// Create a coordinator from a fast and a generic probe.
    pub const fn new(fast: F, generic: G) -> Self {
        Self { fast, generic }
    }

    /// Discover settings for `email_address`.
    pub async fn discover(&self, email_address: &str) -> DiscoveryOutcome {
        match self.fast.attempt(email_address).await {
            found @ DiscoveryOutcome::Found(_) => {
                debug!("Provider shortcut matched, skipping autodiscovery");
                found
            }
            // The fast probe is best effort; anything else falls through
            _ => self.generic.attempt(email_address).await,
        }
    }
}
