//! COST wallet CLI binary entrypoint.
//!
//! This is the main entry point for the `costwallet` command-line tool.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cost_cli::cli::{Cli, Commands};
use cost_cli::commands::{TokenCommand, WalletCommand};
use cost_cli::output::OutputFormat;
use cost_wallet::{WalletConfig, WalletSession};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WalletConfig> {
    let mut config = match &cli.config {
        Some(path) => WalletConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WalletConfig::default(),
    };
    if let Some(url) = &cli.backend {
        config.backend.url.clone_from(url);
        config.validate()?;
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Token { command } => {
            let cmd = TokenCommand::new(config.storage.open()?);
            cmd.execute(&mut stdout, &format, command)?;
        }
        command if cli.local => {
            let session = WalletSession::with_swap_policy(config.local_ledger()?, config.swap);
            let cmd = WalletCommand::new(session, config.tiers.clone());
            cmd.execute(&mut stdout, &format, command).await?;
        }
        command => {
            let backend = config.http_backend(config.storage.open()?)?;
            let session = WalletSession::with_swap_policy(backend, config.swap);
            let cmd = WalletCommand::new(session, config.tiers.clone());
            cmd.execute(&mut stdout, &format, command).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cost_cli::cli::Format;
    use cost_wallet::StorageKind;

    #[test]
    fn cli_parses_balance() {
        let cli = Cli::parse_from(["costwallet", "balance"]);
        assert!(matches!(cli.command, Commands::Balance));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["costwallet", "--format", "json", "balance"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn backend_flag_overrides_config() {
        let cli = Cli::parse_from(["costwallet", "--backend", "https://market.example.com", "balance"]);
        let config = load_config(&cli).expect("config");
        assert_eq!(config.backend.url, "https://market.example.com");
        assert_eq!(config.storage.kind, StorageKind::EncryptedFile);
    }

    #[test]
    fn invalid_backend_flag_rejected() {
        let cli = Cli::parse_from(["costwallet", "--backend", "ftp://market", "balance"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn missing_config_file_rejected() {
        let cli = Cli::parse_from(["costwallet", "--config", "/nonexistent/costwallet.toml", "tiers"]);
        assert!(load_config(&cli).is_err());
    }

    #[tokio::test]
    async fn run_local_balance() {
        let cli = Cli::parse_from(["costwallet", "--local", "balance"]);
        assert!(run(cli).await.is_ok());
    }

    #[tokio::test]
    async fn run_local_swap_without_funds_fails() {
        let cli = Cli::parse_from(["costwallet", "--local", "swap", "FIAT", "COST", "100"]);
        assert!(run(cli).await.is_err());
    }
}
