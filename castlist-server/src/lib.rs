//! HTTP transport for castlist person records.
//!
//! The binary wires configuration and backends; [`create_app`] is shared with
//! the integration tests so they drive the same router.

pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use infra::app_state::AppState;

pub fn create_app(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(routes::create_api_router())
        .layer(TraceLayer::new_for_http());

    if state.config().dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}
