pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod tags;
pub mod types;

#[cfg(test)]
pub mod testing;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{jwt_auth_middleware, require_admin_middleware, validate_user_middleware};

/// Build the full application router
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes())
        .merge(admin_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
}

fn api_routes() -> Router {
    use handlers::protected::{auth, comments, posts, tags, users};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/posts", get(posts::list).post(posts::create))
        .route(
            "/api/posts/:id",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route(
            "/api/posts/:id/comments",
            get(comments::list).post(comments::create),
        )
        .route("/api/comments/:id", axum::routing::delete(comments::delete))
        .route("/api/tags", get(tags::list))
        .route("/api/users/:id", get(users::get).put(users::update))
        // Last layer runs first: authenticate, then load the stored account
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn admin_routes() -> Router {
    use axum::routing::delete;
    use handlers::protected::{tags, users};

    Router::new()
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/users/:id", delete(users::delete))
        .route("/api/admin/users/:id/role", put(users::set_role))
        .route("/api/admin/tags", post(tags::create))
        .route("/api/admin/tags/:id", delete(tags::delete))
        // Last layer runs first: authenticate, load the stored account, then check its role
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Blog API (Rust)",
            "version": version,
            "description": "Users, posts, tags and comments with JWT authentication",
            "endpoints": {
                "auth": "/auth/register, /auth/login, /auth/forgot-password, /auth/reset-password (public)",
                "whoami": "/api/auth/whoami (protected)",
                "posts": "/api/posts[/:id][/comments] (protected)",
                "comments": "/api/comments/:id (protected)",
                "tags": "/api/tags (protected)",
                "users": "/api/users/:id (protected)",
                "admin": "/api/admin/users[/:id][/role], /api/admin/tags[/:id] (admin)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
