use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;
use db::{PgStore, RecordStore};
use services::calendar::Calendar;
use services::oracle::{ClaudeOracle, Oracle};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub oracle: Arc<dyn Oracle>,
    pub calendar: Calendar,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifelog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let oracle = ClaudeOracle::new(&config)?;
    if config.claude_api_key.is_empty() {
        tracing::warn!("CLAUDE_API_KEY is not set; every oracle call will fail");
    }

    let state = AppState {
        store: Arc::new(PgStore::new(pool, config.default_calorie_target)),
        oracle: Arc::new(oracle),
        calendar: Calendar::new(config.timezone),
        config: config.clone(),
    };

    let app = app(state)
        .layer(cors_layer(&config)?)
        .layer(CompressionLayer::new());

    let addr = config.listen_addr();
    tracing::info!(timezone = %config.timezone, "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Chat transport
        .route("/api/messages", post(handlers::messages::post_message))
        .route("/api/commands", post(handlers::messages::post_command))
        // Profile
        .route(
            "/api/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        // Records
        .route(
            "/api/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route("/api/notes/search", get(handlers::notes::search_notes))
        .route("/api/notes/:id", delete(handlers::notes::delete_note))
        .route(
            "/api/food-logs",
            get(handlers::food_logs::list_food_logs).post(handlers::food_logs::create_food_log),
        )
        .route(
            "/api/food-logs/:id",
            delete(handlers::food_logs::delete_food_log),
        )
        .route(
            "/api/workouts",
            get(handlers::workouts::list_workouts).post(handlers::workouts::create_workout),
        )
        .route(
            "/api/workouts/:id",
            delete(handlers::workouts::delete_workout),
        )
        // Aggregates
        .route(
            "/api/summary/daily",
            get(handlers::dashboard::get_daily_summary),
        )
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/api/wellness", get(handlers::dashboard::get_wellness))
        // Free-text oracle calls
        .route("/api/insights", post(handlers::insights::post_insights))
        .route(
            "/api/recommendation",
            post(handlers::insights::post_recommendation),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config.frontend_url.parse::<HeaderValue>()?];
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(auth::middleware::OWNER_HEADER),
        ]))
}
