//! Server settings discovery.
//!
//! Two probes are tried in priority order by [`DiscoveryCoordinator`]:
//!
//! 1. [`ProviderMxProbe`]: looks up the domain's MX records over
//!    DNS-over-HTTPS and recognizes a known provider by exchange hostname.
//!    Best effort; every failure is a silent decline.
//! 2. [`AutoDiscoveryProbe`]: hands the address to an
//!    [`AutoDiscoveryService`] and reports its verdict, including network
//!    errors.

mod autodiscovery;
mod coordinator;
mod dns;
mod known_providers;
mod provider_probe;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use autodiscovery::{AutoDiscoveryProbe, AutoDiscoveryResult, AutoDiscoveryService};
pub use coordinator::DiscoveryCoordinator;
pub use dns::{DnsResolver, MxRecord, MxResolver};
pub use known_providers::KnownProviderDiscovery;
pub use provider_probe::ProviderMxProbe;

use crate::config::DiscoveryConfig;
use crate::settings::DiscoveredSettings;

/// Outcome of one discovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Settings were found.
    Found(DiscoveredSettings),
    /// No settings exist for the address (or the probe declined).
    NotFound,
    /// The network failed; retrying may help.
    NetworkError,
    /// Something unexpected failed; retrying may help.
    UnknownError,
}

/// Discovery failure shown to the user at the address step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// The network failed during discovery.
    #[error("Could not reach the server. Check your connection and try again.")]
    Network,
    /// Discovery failed for an unexpected reason.
    #[error("Something went wrong while looking up your settings.")]
    Unknown,
}

/// A single discovery strategy.
///
/// Implementations never fail past this boundary: every failure is mapped
/// onto a [`DiscoveryOutcome`].
pub trait DiscoveryProbe: Send + Sync {
    /// Try to discover settings for `email_address`.
    fn attempt(&self, email_address: &str) -> impl Future<Output = DiscoveryOutcome> + Send;
}

/// Coordinator wired with the built-in probes.
pub type DefaultCoordinator =
    DiscoveryCoordinator<ProviderMxProbe<DnsResolver>, AutoDiscoveryProbe<KnownProviderDiscovery>>;

/// Build the built-in coordinator from configuration.
#[must_use]
pub fn default_coordinator(config: &DiscoveryConfig) -> DefaultCoordinator {
    let resolver = DnsResolver::over_https(
        config.doh_provider,
        Duration::from_secs(config.fast_probe_timeout_secs),
    );
    let fast = ProviderMxProbe::new(
        resolver,
        config.provider.name.clone(),
        &config.provider.mx_hosts,
    )
    .with_timeout(Duration::from_secs(config.fast_probe_timeout_secs));
    let generic = AutoDiscoveryProbe::new(KnownProviderDiscovery::new())
        .with_timeout(Duration::from_secs(config.generic_probe_timeout_secs));

    DiscoveryCoordinator::new(fast, generic)
}

/// Domain part of an address, lowercased, if it has one.
#[must_use]
pub fn domain_of(email_address: &str) -> Option<String> {
    let (_, domain) = email_address.trim().rsplit_once('@')?;
    let domain = domain.trim_end_matches('.');
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_extraction() {
        assert_eq!(domain_of("user@Example.COM"), Some("example.com".to_string()));
        assert_eq!(domain_of(" user@example.com. "), Some("example.com".to_string()));
        assert_eq!(domain_of("user@"), None);
        assert_eq!(domain_of("user"), None);
    }

    #[tokio::test]
    async fn default_coordinator_skips_unknown_domains() {
        let config = DiscoveryConfig {
            fast_probe_timeout_secs: 1,
            ..DiscoveryConfig::default()
        };
        let coordinator = default_coordinator(&config);
        assert_eq!(
            coordinator.discover("user@unknown.invalid").await,
            DiscoveryOutcome::NotFound
        );
    }
}
