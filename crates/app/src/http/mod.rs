pub mod error;
pub mod router;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves until `shutdown` resolves, then lets in-flight requests finish.
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<(), HttpError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = router::build(state);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
