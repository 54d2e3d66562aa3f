//! HTTP trigger: every request, whatever its method or path, runs one
//! retention pass and answers with the plain-text summary.

use crate::context::AppContext;
use crate::format;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use libreap::Reaper;
use std::sync::Arc;
use tracing::{error, info};

/// Build the trigger router around a shared reaper.
pub fn router(reaper: Arc<Reaper>) -> Router {
    Router::new().fallback(trigger).with_state(reaper)
}

async fn trigger(State(reaper): State<Arc<Reaper>>) -> (StatusCode, String) {
    match reaper.run().await {
        Ok(summary) => (StatusCode::OK, summary.to_string()),
        Err(e) => {
            error!(error = %e, status = e.status_code(), "run aborted");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handle the serve subcommand
pub async fn handle_serve(ctx: &AppContext, bind: &str) {
    if let Err(e) = serve(ctx, bind).await {
        format::error(&e);
        std::process::exit(1);
    }
}

async fn serve(ctx: &AppContext, bind: &str) -> Result<(), String> {
    let reaper = Reaper::from_config(&ctx.config).map_err(|e| e.to_string())?;
    let app = router(Arc::new(reaper));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", bind, e))?;
    info!(address = bind, "listening for triggers");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;
