mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::location::ReferenceStore;

/// Routes over an already-sealed store. Every request re-resolves against
/// it; nothing is fetched again.
pub fn build_router(store: ReferenceStore) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/plot", get(handlers::plot))
        .route("/api/plot.geojson", get(handlers::plot_geojson))
        .route("/api/cities", get(handlers::cities))
        .route("/api/stats", get(handlers::stats))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(store: ReferenceStore, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(store);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Lanka Route server listening on http://{}", addr);
    axum::serve(listener, app).await
}
