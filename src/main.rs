//! Feedback Portal
//!
//! Serves the product catalog, accepts customer feedback and exposes the
//! admin dashboard data.
//!
//! ## Features
//!
//! - **Feedback API**: catalog lookups and validated, rate-limited submissions
//! - **Admin API**: filtered listing, dashboard aggregates and ZIP export

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use feedback_portal::{config, db, handlers};
use handlers::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedback_portal=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Starting Feedback Portal");
    tracing::info!("Environment: {:?}", config.environment);
    tracing::info!("Form policy: {:?}", config.form_policy);

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    // Prune stale rate limit rows
    let maintenance_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            match handlers::rate_limit::prune_attempts(&maintenance_pool).await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Pruned {} rate limit attempts", n),
                Err(e) => tracing::warn!("Failed to prune rate limit attempts: {}", e),
            }
        }
    });

    // Create application state
    let mut state = AppState::new(pool, config.form_policy.clone());
    state.is_production = config.is_production();
    state.trusted_proxies = config.trusted_proxies.clone();
    state.rate_limit_per_hour = config.rate_limit_per_hour;

    // Build CORS layer
    let cors = if config.is_production() {
        CorsLayer::new()
            .allow_origin(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Catalog
        .route("/products", get(handlers::list_products))
        .route("/products/:id/variants", get(handlers::list_variants))
        .route("/issues", get(handlers::list_issues))
        .route("/locations", get(handlers::list_locations))
        .route("/form-policy", get(handlers::get_form_policy))
        // Feedback submission
        .route("/feedback", post(handlers::submit_feedback))
        // Admin
        .route("/admin/feedback", get(handlers::list_feedback))
        .route("/admin/dashboard", get(handlers::get_dashboard_stats))
        .route("/admin/export", get(handlers::export_feedback));

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&config.frontend_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Frontend served from: {}", config.frontend_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
