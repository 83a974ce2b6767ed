//! Autodiscovery from a built-in table of well-known providers.

use tracing::debug;

use super::autodiscovery::{AutoDiscoveryResult, AutoDiscoveryService};
use super::domain_of;
use crate::Error;
use crate::settings::{
    AuthenticationType, ConnectionSecurity, DiscoveredSettings, IncomingServerSettings,
    OutgoingServerSettings, ServerSettings,
};

/// One provider row: domains served and server parameters.
struct ProviderEntry {
    domains: &'static [&'static str],
    imap_host: &'static str,
    smtp_host: &'static str,
    smtp_port: u16,
    smtp_security: ConnectionSecurity,
    authentication_types: &'static [AuthenticationType],
}

const PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        domains: &["gmail.com", "googlemail.com"],
        imap_host: "imap.gmail.com",
        smtp_host: "smtp.gmail.com",
        smtp_port: 465,
        smtp_security: ConnectionSecurity::Tls,
        authentication_types: &[AuthenticationType::OAuth2, AuthenticationType::PasswordCleartext],
    },
    ProviderEntry {
        domains: &["outlook.com", "hotmail.com", "live.com", "msn.com"],
        imap_host: "outlook.office365.com",
        smtp_host: "smtp.office365.com",
        smtp_port: 587,
        smtp_security: ConnectionSecurity::StartTls,
        authentication_types: &[AuthenticationType::OAuth2],
    },
    ProviderEntry {
        domains: &["yahoo.com", "ymail.com", "rocketmail.com"],
        imap_host: "imap.mail.yahoo.com",
        smtp_host: "smtp.mail.yahoo.com",
        smtp_port: 465,
        smtp_security: ConnectionSecurity::Tls,
        authentication_types: &[AuthenticationType::PasswordCleartext, AuthenticationType::OAuth2],
    },
    ProviderEntry {
        domains: &["icloud.com", "me.com", "mac.com"],
        imap_host: "imap.mail.me.com",
        smtp_host: "smtp.mail.me.com",
        smtp_port: 587,
        smtp_security: ConnectionSecurity::StartTls,
        authentication_types: &[AuthenticationType::PasswordCleartext],
    },
];

/// [`AutoDiscoveryService`] answering from the built-in provider table.
///
/// Results are trusted; unknown domains yield
/// [`AutoDiscoveryResult::NoUsableSettingsFound`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownProviderDiscovery;

impl KnownProviderDiscovery {
    /// Create the service.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Look up settings for an address without going through the async API.
    #[must_use]
    pub fn lookup(email_address: &str) -> Option<DiscoveredSettings> {
        let domain = domain_of(email_address)?;
        let entry = PROVIDERS
            .iter()
            .find(|entry| entry.domains.contains(&domain.as_str()))?;

        let username = email_address.trim().to_string();
        let authentication_types = entry.authentication_types.to_vec();

        Some(DiscoveredSettings {
            incoming: IncomingServerSettings::Imap(ServerSettings {
                hostname: entry.imap_host.to_string(),
                port: 993,
                security: ConnectionSecurity::Tls,
                username: username.clone(),
                authentication_types: authentication_types.clone(),
            }),
            outgoing: Some(OutgoingServerSettings::Smtp(ServerSettings {
                hostname: entry.smtp_host.to_string(),
                port: entry.smtp_port,
                security: entry.smtp_security,
                username,
                authentication_types,
            })),
            is_trusted: true,
        })
    }
}

impl AutoDiscoveryService for KnownProviderDiscovery {
    async fn execute(&self, email_address: &str) -> AutoDiscoveryResult {
        if domain_of(email_address).is_none() {
            return AutoDiscoveryResult::UnexpectedError(Error::InvalidAddress(
                email_address.to_string(),
            ));
        }

        match Self::lookup(email_address) {
            Some(settings) => AutoDiscoveryResult::Settings(settings),
            None => {
                debug!("No built-in provider for {email_address}");
                AutoDiscoveryResult::NoUsableSettingsFound
            }
        }
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
    use super::*;
    use crate::settings::classify;

    fn smtp(settings: &DiscoveredSettings) -> &ServerSettings {
        let OutgoingServerSettings::Smtp(server) = settings.outgoing.as_ref().unwrap();
        server
    }

    #[test]
    fn gmail() {
        let settings = KnownProviderDiscovery::lookup("user@gmail.com").unwrap();
        let imap = settings.incoming.server().unwrap();
        assert_eq!(imap.hostname, "imap.gmail.com");
        assert_eq!(imap.port, 993);
        assert_eq!(imap.username, "user@gmail.com");
        assert!(classify(&settings.incoming).requires_oauth);
        assert_eq!(smtp(&settings).port, 465);
        assert!(settings.is_trusted);
    }

    #[test]
    fn googlemail_case_insensitive() {
        let settings = KnownProviderDiscovery::lookup("User@GoogleMail.com").unwrap();
        assert_eq!(settings.incoming.hostname(), Some("imap.gmail.com"));
    }

    #[test]
    fn outlook_family() {
        for address in ["a@outlook.com", "a@hotmail.com", "a@live.com"] {
            let settings = KnownProviderDiscovery::lookup(address).unwrap();
            assert_eq!(settings.incoming.hostname(), Some("outlook.office365.com"));
            assert_eq!(smtp(&settings).security, ConnectionSecurity::StartTls);
        }
    }

    #[test]
    fn yahoo_prefers_password() {
        let settings = KnownProviderDiscovery::lookup("user@ymail.com").unwrap();
        assert!(!classify(&settings.incoming).requires_oauth);
    }

    #[test]
    fn icloud() {
        let settings = KnownProviderDiscovery::lookup("user@me.com").unwrap();
        assert_eq!(settings.incoming.hostname(), Some("imap.mail.me.com"));
        assert_eq!(smtp(&settings).port, 587);
    }

    #[test]
    fn unknown_domain() {
        assert!(KnownProviderDiscovery::lookup("user@example.org").is_none());
    }

    #[tokio::test]
    async fn execute_results() {
        let service = KnownProviderDiscovery::new();
        assert!(matches!(
            service.execute("user@gmail.com").await,
            AutoDiscoveryResult::Settings(_)
        ));
        assert!(matches!(
            service.execute("user@example.org").await,
            AutoDiscoveryResult::NoUsableSettingsFound
        ));
        assert!(matches!(
            service.execute("no-domain").await,
            AutoDiscoveryResult::UnexpectedError(_)
        ));
    }
}
