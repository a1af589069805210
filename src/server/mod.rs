mod handlers;
mod state;
mod static_files;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::geocode::NominatimGeocoder;

pub fn build_router(osrm_url: String, default_country: String) -> Router {
    let state = Arc::new(AppState {
        geocoder: Mutex::new(NominatimGeocoder::new()),
        osrm_url,
        default_country,
    });

    Router::new()
        .route("/", get(handlers::index))
        .route("/style.css", get(handlers::style))
        .route("/app.js", get(handlers::script))
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/distances", post(handlers::distances))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, osrm_url: String, default_country: String) {
    let app = build_router(osrm_url, default_country);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  Postroute server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
