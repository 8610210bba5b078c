use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<Value>) {
    let mut health_status = json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {}
    });

    match &state.postgres {
        Some(postgres) => {
            let stats = postgres.pool_stats();
            health_status["checks"]["database"] = json!({
                "backend": "postgres",
                "size": stats.size,
                "idle": stats.idle,
                "max_size": stats.max_size,
            });
        }
        None => {
            health_status["checks"]["database"] = json!({ "backend": "memory" });
        }
    }

    (StatusCode::OK, Json(health_status))
}
