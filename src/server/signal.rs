//! OS signal handling
//!
//! Unix: `SIGINT`, `SIGTERM` and `SIGQUIT`. Elsewhere: Ctrl-C.

/// Completes when the process receives a termination signal
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv() => tracing::info!("received SIGINT"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigquit.recv() => tracing::info!("received SIGQUIT"),
    }
    Ok(())
}

/// Completes when the process receives Ctrl-C
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("received Ctrl-C");
    Ok(())
}
