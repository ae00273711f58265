//! CLI module for Keyhub
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `migrate`: apply PostgreSQL schema migrations
//! - `bootstrap`: provision a workspace, an Api and a root key

pub mod bootstrap;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Keyhub - root-key scoped API key management
#[derive(Parser)]
#[command(name = "keyhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(serve::ServeArgs),

    /// Apply storage migrations and exit
    Migrate,

    /// Create a workspace, a key-authenticated Api and a root key for it
    Bootstrap(bootstrap::BootstrapArgs),
}

/// Load `.env` and the layered configuration
pub(crate) fn load_config() -> anyhow::Result<crate::config::AppConfig> {
    dotenvy::dotenv().ok();

    Ok(crate::config::AppConfig::load()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["keyhub", "migrate"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate));

        let cli = Cli::try_parse_from(["keyhub", "serve", "--bootstrap"]).unwrap();
        match cli.command {
            Command::Serve(args) => assert!(args.bootstrap),
            _ => panic!("expected serve"),
        }

        let cli = Cli::try_parse_from(["keyhub", "bootstrap", "--api-name", "payments"]).unwrap();
        match cli.command {
            Command::Bootstrap(args) => {
                assert_eq!(args.api_name, "payments");
                assert_eq!(args.prefix, "root");
            }
            _ => panic!("expected bootstrap"),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["keyhub"]).is_err());
    }
}
