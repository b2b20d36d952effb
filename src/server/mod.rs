//! Server lifecycle
//!
//! [`start`] binds the listen address, builds the [`Service`] and serves the
//! HTTP routes until the shutdown token fires. The returned [`ServerHandle`]
//! resolves once in-flight connections have drained and the distributor has
//! stopped.

mod signal;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{create_router, AppState};
use crate::config::{ConfigError, ServiceConfig};
use crate::service::Service;

pub use signal::wait_for_shutdown_signal;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// A running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    service: Arc<Service>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// Wait for the server to stop after shutdown has been requested
    pub async fn wait(self) -> io::Result<()> {
        let served = match self.task.await {
            Ok(result) => result,
            Err(err) => Err(io::Error::new(io::ErrorKind::Other, err)),
        };
        self.service.stopped().await;
        tracing::info!("server stopped");
        served
    }
}

/// Bind the listener and start serving
///
/// Fails without side effects if the address cannot be bound. Cancelling
/// `shutdown` stops accepting calls and ends every open stream.
pub async fn start(
    config: ServiceConfig,
    shutdown: CancellationToken,
) -> Result<ServerHandle, StartupError> {
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.listen_addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        addr: config.listen_addr.clone(),
        source,
    })?;

    let service = Arc::new(Service::new(config.acl, config.options, shutdown.clone()));
    let app = create_router(Arc::new(AppState::new(service.clone())));

    tracing::info!(%local_addr, "listening");

    let task = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    });

    Ok(ServerHandle {
        local_addr,
        service,
        task,
    })
}
