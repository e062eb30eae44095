//! snap_rpc - command line client for the SNAP emulation daemon.
//!
//! Issues one JSON-RPC call given on the command line, or a batch of calls
//! read from stdin, and prints each result as JSON.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snap_rpc::config::{parse_timeout_secs, ClientConfig, Verbosity};
use snap_rpc::ipc::{RpcClient, RpcService, DEFAULT_SOCKET_PATH};
use snap_rpc::script::{parse_params, render, run_script};

/// SNAP JSON-RPC 2.0 command line interface.
///
/// With METHOD, issues a single call. Without it, reads one
/// `METHOD [PARAMS]` command per line from stdin and stops at the first
/// failure.
#[derive(Debug, Parser)]
#[command(name = "snap_rpc", version, about)]
struct Cli {
    /// RPC domain socket path
    #[arg(short = 's', value_name = "SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    server_addr: PathBuf,

    /// Seconds to wait for a response (fractional values allowed)
    #[arg(short = 't', value_name = "TIMEOUT", default_value = "60.0", value_parser = parse_timeout_secs)]
    timeout: Duration,

    /// Verbosity level
    #[arg(short = 'v', value_enum, default_value_t = Verbosity::Error)]
    verbose: Verbosity,

    /// RPC method to call
    method: Option<String>,

    /// Method parameters as a JSON object
    params: Option<String>,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            socket_path: self.server_addr.clone(),
            timeout: self.timeout,
            verbosity: self.verbose,
        }
    }

    /// Nothing to do: no method and no commands piped through stdin.
    fn wants_help(&self, stdin_is_terminal: bool) -> bool {
        self.method.is_none() && stdin_is_terminal
    }
}

fn init_logging(config: &ClientConfig) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.verbosity.filter_directive()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn call_one(client: &mut dyn RpcService, method: &str, params: Option<&str>) -> Result<()> {
    let params = params
        .map(parse_params)
        .transpose()
        .map_err(|e| anyhow!("Failed to parse params: {e}"))?;

    let result = client.call(method, params.as_ref())?;
    println!("{}", render(&result));
    Ok(())
}

fn run(cli: Cli, config: &ClientConfig) -> Result<()> {
    let mut client = RpcClient::from_config(config)?;
    tracing::info!(
        "Connected to {} (timeout {:?})",
        config.socket_path.display(),
        config.timeout
    );

    match cli.method.as_deref() {
        Some(method) => call_one(&mut client, method, cli.params.as_deref()),
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            let count = run_script(&mut client, stdin.lock(), &mut stdout)?;
            tracing::info!("Executed {} commands", count);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.wants_help(io::stdin().is_terminal()) {
        // Help alone, with no error message
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    }

    let config = cli.config();
    init_logging(&config);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_only_without_method_on_terminal() {
        let cli = Cli::try_parse_from(["snap_rpc"]).unwrap();
        assert!(cli.wants_help(true));
        assert!(!cli.wants_help(false), "piped stdin runs a batch");

        let cli = Cli::try_parse_from(["snap_rpc", "controller_list"]).unwrap();
        assert!(!cli.wants_help(true));
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::try_parse_from([
            "snap_rpc", "-s", "/tmp/snap.sock", "-t", "0.5", "-v", "DEBUG", "emulation_list",
        ])
        .unwrap();
        let config = cli.config();

        assert_eq!(config.socket_path, PathBuf::from("/tmp/snap.sock"));
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.verbosity, Verbosity::Debug);
        assert_eq!(config.verbosity.filter_directive(), "snap_rpc=debug");
    }

    #[test]
    fn test_defaults_match_client_config() {
        let cli = Cli::try_parse_from(["snap_rpc", "controller_list"]).unwrap();
        assert_eq!(cli.config(), ClientConfig::default());
    }
}
