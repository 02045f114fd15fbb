//! HTTP server lifecycle.
//!
//! Serves the router until the cancellation token fires, then lets
//! in-flight requests drain for at most the shutdown grace period.

use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Serve `app` on `listener` until `cancel` is triggered.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
) -> io::Result<()> {
    let addr = listener.local_addr()?;
    log::info!("[server] Listening on http://{}", addr);

    let shutdown = cancel.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown.cancelled().await;
    });
    let mut handle = tokio::spawn(async move { server.await });

    let result = tokio::select! {
        joined = &mut handle => joined,
        _ = cancel.cancelled() => {
            log::info!("[server] Shutting down, draining in-flight requests");
            match tokio::time::timeout(shutdown_timeout, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    log::warn!(
                        "[server] Requests still running after {:?}, aborting",
                        shutdown_timeout
                    );
                    handle.abort();
                    return Ok(());
                }
            }
        }
    };

    result.map_err(io::Error::other)??;
    log::info!("[server] Server stopped");
    Ok(())
}

/// Cancel `token` on Ctrl-C.
pub async fn shutdown_on_ctrl_c(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("[server] Failed to listen for Ctrl-C: {}", e);
        return;
    }
    log::info!("[server] Received Ctrl-C");
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/", get(|| async { "ok" }));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(serve(
            listener,
            app,
            cancel.clone(),
            Duration::from_secs(5),
        ));
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
