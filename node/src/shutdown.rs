//! OS signals that stop the expiry loop.

use tokio::signal;

/// Resolves on the first SIGINT or SIGTERM.
///
/// Pass it to [`KnomeeNode::run`](crate::KnomeeNode::run). A signal whose
/// handler cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("received SIGINT, stopping expiry loop"),
            Err(e) => {
                tracing::warn!(error = %e, "SIGINT handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("received SIGTERM, stopping expiry loop");
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
