//! `OAuth2` provider endpoints, keyed by incoming mail server.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Providers the sub-flow can authorize against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google / Gmail.
    Google,
    /// Microsoft / Outlook.com / Office 365.
    Microsoft,
    /// Yahoo Mail.
    Yahoo,
}

impl ProviderKind {
    /// Resolves the provider that serves the given IMAP hostname.
    ///
    /// Matching is case-insensitive and ignores a trailing root dot.
    #[must_use]
    pub fn for_hostname(hostname: &str) -> Option<Self> {
        let host = hostname.trim_end_matches('.').to_ascii_lowercase();
        match host.as_str() {
            "imap.gmail.com" | "imap.googlemail.com" | "smtp.gmail.com" => Some(Self::Google),
            "outlook.office365.com" | "imap-mail.outlook.com" | "smtp.office365.com" => {
                Some(Self::Microsoft)
            }
            "imap.mail.yahoo.com" | "export.imap.mail.yahoo.com" | "smtp.mail.yahoo.com" => {
                Some(Self::Yahoo)
            }
            h if h.ends_with(".office365.com") => Some(Self::Microsoft),
            _ => None,
        }
    }

    /// Display name for the provider.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Microsoft => "Microsoft",
            Self::Yahoo => "Yahoo",
        }
    }
}

/// `OAuth2` endpoint configuration for a provider.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Which provider this is.
    pub kind: ProviderKind,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Scopes needed for IMAP and SMTP access.
    pub scopes: Vec<String>,
}

impl Provider {
    /// Builds the endpoint configuration for a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in URL fails to parse.
    pub fn new(kind: ProviderKind) -> Result<Self> {
        let (auth_url, token_url, scopes): (&str, &str, &[&str]) = match kind {
            ProviderKind::Google => (
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
                &["https://mail.google.com/"],
            ),
            ProviderKind::Microsoft => (
                "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
                "https://login.microsoftonline.com/common/oauth2/v2.0/token",
                &[
                    "https://outlook.office.com/IMAP.AccessAsUser.All",
                    "https://outlook.office.com/SMTP.Send",
                    "offline_access",
                ],
            ),
            ProviderKind::Yahoo => (
                "https://api.login.yahoo.com/oauth2/request_auth",
                "https://api.login.yahoo.com/oauth2/get_token",
                &["mail-w", "mail-r"],
            ),
        };

        Ok(Self {
            kind,
            auth_url: Url::parse(auth_url)?,
            token_url: Url::parse(token_url)?,
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    /// Builds the provider for an incoming server hostname.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedHost`] if no provider serves the host.
    pub fn for_hostname(hostname: &str) -> Result<Self> {
        let kind = ProviderKind::for_hostname(hostname)
            .ok_or_else(|| Error::UnsupportedHost(hostname.to_string()))?;
        Self::new(kind)
    }
}

/// Client registrations, one optional client ID per provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google client ID.
    pub google_client_id: Option<String>,
    /// Microsoft client ID.
    pub microsoft_client_id: Option<String>,
    /// Yahoo client ID.
    pub yahoo_client_id: Option<String>,
    /// Redirect URI registered with every provider.
    pub redirect_uri: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            microsoft_client_id: None,
            yahoo_client_id: None,
            redirect_uri: "http://localhost:8080".to_string(),
        }
    }
}

impl ClientConfig {
    /// Returns the client ID registered for a provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingClientId`] if none is configured.
    pub fn client_id(&self, kind: ProviderKind) -> Result<&str> {
        let id = match kind {
            ProviderKind::Google => self.google_client_id.as_deref(),
            ProviderKind::Microsoft => self.microsoft_client_id.as_deref(),
            ProviderKind::Yahoo => self.yahoo_client_id.as_deref(),
        };
        id.filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MissingClientId(kind.display_name().to_string()))
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

    #[test]
    fn test_kind_for_known_hosts() {
        assert_eq!(
            ProviderKind::for_hostname("imap.gmail.com"),
            Some(ProviderKind::Google)
        );
        assert_eq!(
            ProviderKind::for_hostname("IMAP.GMAIL.COM."),
            Some(ProviderKind::Google)
        );
        assert_eq!(
            ProviderKind::for_hostname("outlook.office365.com"),
            Some(ProviderKind::Microsoft)
        );
        assert_eq!(
            ProviderKind::for_hostname("eu.imap.office365.com"),
            Some(ProviderKind::Microsoft)
        );
        assert_eq!(
            ProviderKind::for_hostname("imap.mail.yahoo.com"),
            Some(ProviderKind::Yahoo)
        );
    }

    #[test]
    fn test_kind_for_unknown_host() {
        assert_eq!(ProviderKind::for_hostname("imap.example.org"), None);
        assert!(matches!(
            Provider::for_hostname("imap.example.org"),
            Err(Error::UnsupportedHost(_))
        ));
    }

    #[test]
    fn test_microsoft_scopes() {
        let provider = Provider::new(ProviderKind::Microsoft).unwrap();
        assert_eq!(provider.scopes.len(), 3);
        assert!(provider.scopes.contains(&"offline_access".to_string()));
    }

    #[test]
    fn test_client_id_lookup() {
        let config = ClientConfig {
            google_client_id: Some("g-123".to_string()),
            yahoo_client_id: Some(String::new()),
            ..ClientConfig::default()
        };
        assert_eq!(config.client_id(ProviderKind::Google).unwrap(), "g-123");
        assert!(matches!(
            config.client_id(ProviderKind::Microsoft),
            Err(Error::MissingClientId(_))
        ));
        assert!(config.client_id(ProviderKind::Yahoo).is_err());
    }
}
