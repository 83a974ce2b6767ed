//! `MailWizard` - email account onboarding from the terminal
//!
//! Discovers server settings for an address, runs the `OAuth2` sub-flow when
//! the provider requires it, and prints the resulting account state.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod wizard;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mailwizard_core::{
    AccountState, DefaultValidator, DiscoveryOutcome, Effect, InMemoryAccountStateRepository,
    OnboardingSession, OnboardingStateMachine, Validator, WizardConfig, classify,
    default_coordinator,
};
use mailwizard_oauth::OAuthSession;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, ConfigCommands};
use wizard::Wizard;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for the wizard
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailwizard=info,mailwizard_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(WizardConfig::default_path);

    match cli.command {
        Commands::Discover { email } => discover(&config_path, &email).await,
        Commands::Setup => setup(&config_path).await,
        Commands::Config { operation } => match operation {
            ConfigCommands::Init { force } => init_config(&config_path, force).await,
            ConfigCommands::Show => show_config(&config_path).await,
        },
    }
}

async fn load_config(path: &Path) -> Result<WizardConfig> {
    WizardConfig::load(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Run discovery once and print what was found.
async fn discover(config_path: &Path, email: &str) -> Result<()> {
    if let Err(e) = DefaultValidator.validate_email_address(email) {
        bail!("{}", e.message());
    }

    let config = load_config(config_path).await?;
    let coordinator = default_coordinator(&config.discovery);

    info!("Discovering settings for {email}");
    match coordinator.discover(email.trim()).await {
        DiscoveryOutcome::Found(settings) => {
            let classification = classify(&settings.incoming);
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!(
                "trusted: {}, requires OAuth2: {}, placeholder: {}",
                settings.is_trusted, classification.requires_oauth, classification.is_placeholder
            );
        }
        DiscoveryOutcome::NotFound => println!("No settings found for {email}"),
        DiscoveryOutcome::NetworkError => bail!("Network error during discovery"),
        DiscoveryOutcome::UnknownError => bail!("Discovery failed"),
    }
    Ok(())
}

/// Interactive onboarding on stdin/stdout.
async fn setup(config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let coordinator = Arc::new(default_coordinator(&config.discovery));
    let repository = Arc::new(InMemoryAccountStateRepository::new());

    let machine = OnboardingStateMachine::new(
        Box::new(DefaultValidator),
        repository.clone(),
        OAuthSession::new(config.oauth)?,
    );
    let session = OnboardingSession::new(machine, coordinator);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let effect = Wizard::new(session, stdin, tokio::io::stdout()).run().await?;

    match effect {
        Effect::NavigateBack => println!("Setup cancelled."),
        Effect::NavigateNext {
            is_automatic_config,
            incoming_protocol_type,
        } => {
            println!(
                "Setup complete (automatic configuration: {is_automatic_config}, incoming protocol: {})",
                incoming_protocol_type.map_or("unknown", |p| p.as_str())
            );
            if let Some(state) = repository.get() {
                println!("{}", serde_json::to_string_pretty(&redacted(state))?);
            }
        }
    }
    Ok(())
}

fn redacted(mut state: AccountState) -> AccountState {
    if state.password.is_some() {
        state.password = Some("********".to_string());
    }
    if let Some(token) = state.authorization_token.as_mut() {
        token.access_token = "********".to_string();
        token.refresh_token = token.refresh_token.as_ref().map(|_| "********".to_string());
    }
    state
}

async fn init_config(path: &Path, force: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(path).await? {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    WizardConfig::default().save(path).await?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

async fn show_config(path: &Path) -> Result<()> {
    let config = load_config(path).await?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailwizard_oauth::Token;

    use super::*;

    #[test]
    fn redacts_secrets() {
        let state = AccountState {
            email_address: "user@example.com".to_string(),
            password: Some("secret".to_string()),
            discovered_settings: None,
            authorization_token: Some(Token::bearer("access")),
            is_automatic_config: true,
        };

        let json = serde_json::to_string(&redacted(state)).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("\"access\""));
        assert!(json.contains("user@example.com"));
    }

    #[test]
    fn keeps_missing_password_empty() {
        let state = AccountState {
            email_address: "user@example.com".to_string(),
            password: None,
            discovered_settings: None,
            authorization_token: None,
            is_automatic_config: false,
        };
        assert!(redacted(state).password.is_none());
    }
}
