//! Process signals that end the session.

use std::future::Future;

use tracing::{error, info};

/// Resolves on Ctrl-C or, on unix, SIGTERM from the service manager.
pub async fn signal() {
    let ctrl_c = wait_for("SIGINT", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                wait_for("SIGTERM", async move {
                    sigterm.recv().await;
                    Ok(())
                })
                .await
            }
            Err(e) => wait_for("SIGTERM", std::future::ready(Err(e))).await,
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }
}

/// Wait for one signal.  A handler that cannot be installed never fires.
async fn wait_for<F>(name: &str, signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Received {}", name),
        Err(e) => {
            error!("Cannot listen for {}: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}
