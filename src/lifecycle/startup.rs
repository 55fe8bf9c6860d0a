//! Startup orchestration.

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::routing::RegistryError;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("operation registry invalid: {0}")]
    Registry(#[from] RegistryError),

    #[error("upstream client setup failed: {0}")]
    Upstream(#[from] RelayError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind the inbound listener.
pub async fn bind_listener(config: &RelayConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}
