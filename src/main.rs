//! Call Monitor - Binary Entry Point

use std::process::ExitCode;

use call_monitor::server::{self, wait_for_shutdown_signal};
use call_monitor::telemetry::init_logging;
use call_monitor::ServiceConfig;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(&config.log) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        service = call_monitor::NAME,
        version = call_monitor::VERSION,
        consumers = config.acl.consumer_count(),
        "starting"
    );

    let shutdown = CancellationToken::new();
    let handle = match server::start(config, shutdown.clone()).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = wait_for_shutdown_signal().await {
        tracing::error!(error = %err, "failed to listen for signals");
    }
    shutdown.cancel();

    match handle.wait().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}
