//! `flowframe` binary: stream producer events to standard output.
//!
//! Diagnostics go to standard error so they never interleave with the
//! dispatched events. Ctrl+C cancels the dispatcher; any fatal error exits
//! with a non-zero status.

mod cli;

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use clap::Parser;
use flowframe::{ClientConfig, WriterSink, run_client};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = cli::Cli::parse();
    let config = ClientConfig::default()
        .with_addr(SocketAddr::new(cli.host, cli.port))
        .with_heartbeat_interval(Duration::from_millis(cli.heartbeat_ms))
        .with_queue_capacity(cli.queue_capacity);

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        token.cancel();
    });

    match run_client(config, WriterSink::new(tokio::io::stdout()), shutdown).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}
