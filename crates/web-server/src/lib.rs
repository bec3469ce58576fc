use axum::{Router, routing::get};
use engine::RiskService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub service: RiskService,
}

/// Builds the read-only query API.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/symbols", get(handlers::list_symbols))
        .route("/api/risk/:symbol", get(handlers::get_risk))
        .route("/api/price/:symbol", get(handlers::get_price))
        .route("/api/score/:symbol", get(handlers::get_score))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves the query API on `addr` until the process is stopped.
/// Tracing must already be initialized by the caller.
pub async fn run_server(addr: SocketAddr, service: RiskService) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState { service }));

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
