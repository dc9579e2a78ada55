//! HTTP surface for hotdogjobs.
//!
//! Exposes the materialized store through `GET /jobs/{id}` and accepts new
//! jobs on `POST /jobs`.

pub mod query;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;

use hotdogjobs_shared::{HotdogError, Result};
use tokio::net::TcpListener;
use tracing::info;

pub use query::JobQuery;
pub use routes::{AppState, HotDogResponse, SubmitResponse, router};

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| HotdogError::Server(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, "query server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| HotdogError::Server(e.to_string()))
}
