//! Wizard configuration, persisted as JSON in the user's config directory.

use std::path::{Path, PathBuf};

use mailwizard_oauth::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Discovery settings.
    pub discovery: DiscoveryConfig,
    /// `OAuth2` client registrations.
    pub oauth: ClientConfig,
}

/// Settings for the discovery probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// DNS-over-HTTPS service used for MX lookups.
    pub doh_provider: DohProvider,
    /// Timeout for the provider shortcut, in seconds.
    pub fast_probe_timeout_secs: u64,
    /// Timeout for the autodiscovery service, in seconds.
    pub generic_probe_timeout_secs: u64,
    /// Provider recognized by the shortcut.
    pub provider: ProviderShortcutConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            doh_provider: DohProvider::default(),
            fast_probe_timeout_secs: 5,
            generic_probe_timeout_secs: 10,
            provider: ProviderShortcutConfig::default(),
        }
    }
}

/// Public DNS-over-HTTPS services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DohProvider {
    /// `cloudflare-dns.com`
    #[default]
    Cloudflare,
    /// `dns.google`
    Google,
    /// `dns.quad9.net`
    Quad9,
}

/// Provider the shortcut recognizes, by exact MX hostname.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderShortcutConfig {
    /// Provider name, for logs.
    pub name: String,
    /// Mail exchanger hostnames operated by the provider.
    pub mx_hosts: Vec<String>,
}

impl Default for ProviderShortcutConfig {
    fn default() -> Self {
        Self {
            name: "Google Workspace".to_string(),
            mx_hosts: [
                "smtp.google.com",
                "aspmx.l.google.com",
                "alt1.aspmx.l.google.com",
                "alt2.aspmx.l.google.com",
                "alt3.aspmx.l.google.com",
                "alt4.aspmx.l.google.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl WizardConfig {
    /// Default location: `<config_dir>/mailwizard/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailwizard")
            .join("config.json")
    }

    /// Load configuration from `path`, falling back to defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        info!("Config saved to {}", path.display());
        Ok(())
    }
}
