//! Provider shortcut: recognize a provider by its mail exchangers.

use std::time::Duration;

use tracing::{debug, info};

use super::dns::MxResolver;
use super::{DiscoveryOutcome, DiscoveryProbe, domain_of};
use crate::settings::DiscoveredSettings;

/// Default bound on the whole lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Matches a domain's MX hostnames against a provider's allow-list.
///
/// On a match the result is a trusted placeholder: the domain belongs to the
/// provider, but no protocol parameters are resolved. Anything else, including
/// lookup failures and timeouts, declines with [`DiscoveryOutcome::NotFound`].
#[derive(Debug, Clone)]
pub struct ProviderMxProbe<R> {
    resolver: R,
    provider_name: String,
    mx_hosts: Vec<String>,
    timeout: Duration,
}

impl<R: MxResolver> ProviderMxProbe<R> {
    /// Create a probe for `provider_name` recognized by `mx_hosts`.
    pub fn new(resolver: R, provider_name: impl Into<String>, mx_hosts: &[String]) -> Self {
        Self {
            resolver,
            provider_name: provider_name.into(),
            mx_hosts: mx_hosts
                .iter()
                .map(|host| host.trim_end_matches('.').to_ascii_lowercase())
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound the lookup by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_provider_host(&self, exchange: &str) -> bool {
        let exchange = exchange.trim_end_matches('.');
        self.mx_hosts
            .iter()
            .any(|host| host.eq_ignore_ascii_case(exchange))
    }
}

impl<R: MxResolver> DiscoveryProbe for ProviderMxProbe<R> {
    async fn attempt(&self, email_address: &str) -> DiscoveryOutcome {
        let Some(domain) = domain_of(email_address) else {
            debug!("No domain in address, skipping provider lookup");
            return DiscoveryOutcome::NotFound;
        };

        let records =
            match tokio::time::timeout(self.timeout, self.resolver.resolve_mx(&domain)).await {
                Ok(Ok(records)) => records,
                Ok(Err(e)) => {
                    debug!("MX lookup for {domain} failed: {e}");
                    return DiscoveryOutcome::NotFound;
                }
                Err(_) => {
                    debug!("MX lookup for {domain} timed out after {:?}", self.timeout);
                    return DiscoveryOutcome::NotFound;
                }
            };

        if records
            .iter()
            .any(|record| self.is_provider_host(&record.exchange))
        {
            info!("{domain} is served by {}", self.provider_name);
            DiscoveryOutcome::Found(DiscoveredSettings::trusted_placeholder())
        } else {
            debug!("{domain} is not served by {}", self.provider_name);
            DiscoveryOutcome::NotFound
        }
    }
}
