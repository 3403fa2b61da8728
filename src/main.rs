use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use healthmate_api::config;
use healthmate_api::database::manager::DatabaseManager;
use healthmate_api::handlers;
use healthmate_api::middleware::require_auth;
use healthmate_api::services::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting HealthMate API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("HEALTHMATE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 HealthMate API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API, gated by the bearer-token middleware
        .merge(api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config::config().api.max_request_size_bytes))
        .with_state(AppState::from_config())
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register::register_post))
        .route("/auth/login", post(auth::login::login_post))
}

fn api_routes() -> Router<AppState> {
    use handlers::protected::{auth, family_members, reports, upload, vitals};

    Router::new()
        .route("/api/auth/me", get(auth::me::me_get))
        .route(
            "/api/family-members",
            get(family_members::list).post(family_members::create),
        )
        .route(
            "/api/family-members/:id",
            get(family_members::get)
                .put(family_members::update)
                .delete(family_members::delete),
        )
        .route("/api/reports", get(reports::list))
        .route("/api/reports/upload", post(upload::upload_post))
        .route(
            "/api/reports/:id",
            get(reports::get).delete(reports::delete),
        )
        .route("/api/vitals", get(vitals::list).post(vitals::create))
        .route(
            "/api/vitals/:id",
            put(vitals::update).delete(vitals::delete),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "HealthMate API",
            "version": version,
            "description": "Personal and family health-record API with bilingual AI report summaries",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/me (protected)",
                "family_members": "/api/family-members[/:id] (protected)",
                "reports": "/api/reports[/:id], /api/reports/upload (protected)",
                "vitals": "/api/vitals[/:id] (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
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
            axum::response::Json(json!({
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
