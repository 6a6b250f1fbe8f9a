// handlers/public/system.rs - Service banner and health check

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - Service name, version and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "name": "Forum API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login, /api/auth/logout",
            "qa": "/qa, /qa/stats, /qa/:id, /qa/ask, /qa/:id/answer, /qa/answer/:id/accept",
            "answers": "/api/answers, /api/answers/:id/accept, /api/answers/:id/like",
            "posts": "/api/posts, /post/new, /post/:id/reply",
            "tech_share": "/api/tech-share/publish, /api/tech-share/:id",
            "resources": "/api/resources, /api/resources/:id",
            "users": "/api/user/me, /api/user/:id/follow"
        }
    }))
}

/// GET /health - Liveness plus database connectivity
pub async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "status": "degraded",
                    "timestamp": now
                })),
            )
        }
    }
}
