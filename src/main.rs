//! Bookshelf Server - book catalog, bookings and ratings
//!
//! REST API server entry point.

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{redis::RedisService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    init_tracing(&config);

    tracing::info!("Starting Bookshelf Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let sessions = RedisService::new(&config.redis.url).await?;

    tracing::info!("Connected to Redis");

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, Arc::new(sessions));

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookshelf_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Sessions
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/logout", post(api::auth::logout))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users/me", get(api::users::get_me))
        .route("/users/me/bookings", get(api::bookings::my_bookings))
        .route("/users/me/ratings", get(api::ratings::my_ratings))
        .route("/users/me/recommendations", get(api::ratings::my_recommendations))
        .route(
            "/users/:id",
            get(api::users::get_user).patch(api::users::update_user),
        )
        .route("/users/:id/bookings", get(api::bookings::user_bookings))
        // Books
        .route(
            "/books",
            get(api::books::list_books).post(api::books::create_book),
        )
        .route("/books/search", post(api::books::search_books))
        .route("/books/report", get(api::bookings::sales_report))
        .route("/books/category/names", get(api::categories::category_names))
        .route(
            "/books/category/:category_name",
            get(api::categories::books_in_category),
        )
        // Bookings: GET takes a status, PATCH a booking id
        .route("/books/bookings", get(api::bookings::list_bookings))
        .route(
            "/books/bookings/:id",
            get(api::bookings::list_bookings_by_status).patch(api::bookings::update_booking),
        )
        .route(
            "/books/:id",
            get(api::books::get_book).patch(api::books::update_book),
        )
        .route(
            "/books/:id/category",
            post(api::categories::add_category).delete(api::categories::remove_category),
        )
        .route(
            "/books/:id/bookings",
            post(api::bookings::create_booking).get(api::bookings::book_bookings),
        )
        .route("/books/:id/bookings/me", get(api::bookings::my_book_bookings))
        .route(
            "/books/:id/ratings",
            put(api::ratings::rate_book).get(api::ratings::book_ratings),
        )
        .route("/books/:id/ratings/me", get(api::ratings::my_book_rating))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api", api_routes)
        .merge(openapi)
        .fallback(api::route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
