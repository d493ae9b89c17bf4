//! HTTP server for rulesd

use crate::engine::RulesEngine;
use crate::routes;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use rules_common::Config;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub engine: RulesEngine,
    pub config: Config,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: RulesEngine, config: Config) -> Self {
        Self {
            engine,
            config,
            start_time: Instant::now(),
        }
    }

    /// State wired to Ollama and the configured rule file
    pub fn from_config(config: Config) -> Self {
        Self::new(RulesEngine::from_config(&config), config)
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.server.cors_enabled;
    let max_body = state.config.server.max_body_bytes;

    let mut app = Router::new()
        .merge(routes::evaluate_routes())
        .merge(routes::health_routes())
        .merge(routes::info_routes())
        .with_state(state)
        // enforced in the extractor so /evaluate can answer with its JSON 413
        .layer(DefaultBodyLimit::max(max_body));

    if cors_enabled {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C or SIGTERM
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.listen_addr();
    let port = state.config.server.port;
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on {}", addr);
    info!("  Documentation: http://localhost:{}", port);
    info!("  Health check: http://localhost:{}/health", port);
    info!("  Main endpoint: POST http://localhost:{}/evaluate", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down gracefully");
}
