//! `agency`: CLI entry point. Thin the way `codex-session::main` is —
//! parse, init logging, dispatch, map the final error to an exit code.

use agency_cli::cli::Cli;
use agency_cli::{default_log_filter, dispatch};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let exit_code = match dispatch(cli, &token).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            if let Some(details) = err.details() {
                for (key, value) in details {
                    eprintln!("  {key}: {value}");
                }
            }
            1
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
