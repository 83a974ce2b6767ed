//! MX lookups, over DNS-over-HTTPS by default.

use std::future::Future;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use tracing::debug;

use crate::Result;
use crate::config::DohProvider;

/// One mail exchanger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    /// Preference; lower is preferred.
    pub preference: u16,
    /// Exchange hostname, lowercased, without the trailing root dot.
    pub exchange: String,
}

/// Resolves MX records for a domain.
pub trait MxResolver: Send + Sync {
    /// Look up the MX records of `domain`.
    fn resolve_mx(&self, domain: &str) -> impl Future<Output = Result<Vec<MxRecord>>> + Send;
}

/// MX resolver backed by hickory.
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Resolve over HTTPS through `provider`, giving up on a query after `timeout`.
    #[must_use]
    pub fn over_https(provider: DohProvider, timeout: Duration) -> Self {
        let config = match provider {
            DohProvider::Cloudflare => ResolverConfig::cloudflare_https(),
            DohProvider::Google => ResolverConfig::google_https(),
            DohProvider::Quad9 => ResolverConfig::quad9_https(),
        };
        Self::with_config(config, timeout)
    }

    /// Resolve through the name servers in `config`.
    #[must_use]
    pub fn with_config(config: ResolverConfig, timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

impl MxResolver for DnsResolver {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<MxRecord>> {
        debug!("Querying MX records for {domain}");

        let lookup = match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => lookup,
            Err(e) => {
                // NXDOMAIN and empty answers are not failures
                if let ResolveErrorKind::NoRecordsFound {
                    response_code: ResponseCode::NoError | ResponseCode::NXDomain,
                    ..
                } = e.kind()
                {
                    return Ok(Vec::new());
                }
                return Err(e.into());
            }
        };

        Ok(lookup
            .iter()
            .map(|mx| MxRecord {
                preference: mx.preference(),
                exchange: mx
                    .exchange()
                    .to_ascii()
                    .trim_end_matches('.')
                    .to_ascii_lowercase(),
            })
            .collect())
    }
}

impl std::fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsResolver").finish_non_exhaustive()
    }
}
