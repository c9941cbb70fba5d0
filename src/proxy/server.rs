use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::constants::{MAX_BODY_BYTES, REQUEST_ID_HEADER};
use crate::error::AppResult;
use crate::proxy::config::ProxyConfig;
use crate::proxy::handlers;
use crate::proxy::middleware::request_id_middleware;
use crate::proxy::upstream::{CopilotClientFactory, HttpCopilotClientFactory};

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub copilot: Arc<dyn CopilotClientFactory>,
}

impl AppState {
    pub fn new(config: ProxyConfig, copilot: Arc<dyn CopilotClientFactory>) -> Self {
        Self {
            config: Arc::new(config),
            copilot,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    Router::new()
        .route("/healthz", get(handlers::handle_healthz))
        .route("/models", get(handlers::handle_list_models))
        .route("/v1/models", get(handlers::handle_list_models))
        .route("/chat/completions", post(handlers::handle_chat_completions))
        .route("/v1/chat/completions", post(handlers::handle_chat_completions))
        .route("/debug/copilot/logs", get(handlers::handle_debug_logs))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(config: ProxyConfig) -> AppResult<()> {
    let factory = HttpCopilotClientFactory::new(&config)?;
    let addr = config.listen_addr();

    info!(
        "Copilot gateway flags: DEBUG_ERRORS={} ALLOW_LOGGED_IN_USER={} COPILOT_LOG_LEVEL={} COPILOT_LOG_DIR={}",
        config.debug_errors,
        config.allow_logged_in_user,
        config.copilot_log_level,
        config.copilot_log_dir.display()
    );

    let state = AppState::new(config, Arc::new(factory));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Copilot gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Copilot gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
