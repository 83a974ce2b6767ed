//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MailWizard - set up an email account from the terminal
#[derive(Parser, Debug)]
#[command(name = "mailwizard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "MAILWIZARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover server settings for an address and print them
    Discover {
        /// Email address to look up
        email: String,
    },

    /// Run the interactive onboarding wizard
    Setup,

    /// Configuration operations
    Config {
        #[command(subcommand)]
        operation: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_discover() {
        let cli = Cli::try_parse_from(["mailwizard", "discover", "user@example.com"]).unwrap();
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Commands::Discover { email } if email == "user@example.com"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["mailwizard", "setup", "--config", "/tmp/wizard.json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/wizard.json")));
        assert!(matches!(cli.command, Commands::Setup));
    }

    #[test]
    fn config_init_force() {
        let cli = Cli::try_parse_from(["mailwizard", "config", "init", "-f"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                operation: ConfigCommands::Init { force: true }
            }
        ));
    }

    #[test]
    fn missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["mailwizard"]).is_err());
    }
}
