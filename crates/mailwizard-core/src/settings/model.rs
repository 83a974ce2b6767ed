//! Discovered server settings.

use serde::{Deserialize, Serialize};

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionSecurity {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl ConnectionSecurity {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// Authentication mechanism a server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticationType {
    /// Plain password over an encrypted connection.
    PasswordCleartext,
    /// `OAuth2` bearer token (XOAUTH2 / OAUTHBEARER).
    OAuth2,
}

/// Host, port and credentials shape for one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server hostname.
    pub hostname: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: ConnectionSecurity,
    /// Username for authentication.
    pub username: String,
    /// Accepted authentication mechanisms, most preferred first.
    pub authentication_types: Vec<AuthenticationType>,
}

/// Protocol of a recognized incoming server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomingProtocolType {
    /// IMAP4rev1 / IMAP4rev2.
    Imap,
    /// POP3.
    Pop3,
}

impl IncomingProtocolType {
    /// Protocol identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Imap => "imap",
            Self::Pop3 => "pop3",
        }
    }
}

/// Incoming server settings produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomingServerSettings {
    /// IMAP server.
    Imap(ServerSettings),
    /// POP3 server.
    Pop3(ServerSettings),
    /// Marker from the provider shortcut: the domain is known, but no
    /// protocol parameters were resolved.
    Placeholder,
}

impl IncomingServerSettings {
    /// Protocol of the settings, or `None` if unrecognized.
    #[must_use]
    pub const fn protocol_type(&self) -> Option<IncomingProtocolType> {
        match self {
            Self::Imap(_) => Some(IncomingProtocolType::Imap),
            Self::Pop3(_) => Some(IncomingProtocolType::Pop3),
            Self::Placeholder => None,
        }
    }

    /// Concrete server parameters, if any.
    #[must_use]
    pub const fn server(&self) -> Option<&ServerSettings> {
        match self {
            Self::Imap(server) | Self::Pop3(server) => Some(server),
            Self::Placeholder => None,
        }
    }

    /// Server hostname, if any.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.server().map(|server| server.hostname.as_str())
    }
}

/// Outgoing server settings produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutgoingServerSettings {
    /// SMTP submission server.
    Smtp(ServerSettings),
}

/// Result of a successful discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredSettings {
    /// Incoming server.
    pub incoming: IncomingServerSettings,
    /// Outgoing server, if discovered.
    pub outgoing: Option<OutgoingServerSettings>,
    /// Whether the source is trusted enough to skip user approval.
    pub is_trusted: bool,
}

impl DiscoveredSettings {
    /// Trusted marker for a domain recognized by the provider shortcut.
    #[must_use]
    pub const fn trusted_placeholder() -> Self {
        Self {
            incoming: IncomingServerSettings::Placeholder,
            outgoing: None,
            is_trusted: true,
        }
    }
}
