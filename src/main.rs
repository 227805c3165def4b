use axum::http::{header, HeaderValue};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outreach::auth::token::TokenConfig;
use outreach::note::repository::{InMemoryNoteRepository, PostgresNoteRepository};
use outreach::retreat::repository::{InMemoryRetreatRepository, PostgresRetreatRepository};
use outreach::servantee::repository::{InMemoryServanteeRepository, PostgresServanteeRepository};
use outreach::shared::AppState;
use outreach::user::repository::{InMemoryUserRepository, PostgresUserRepository};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outreach=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting outreach management server");

    let tokens = TokenConfig::new();

    // Repositories are injected once at startup. With DATABASE_URL set the
    // server runs against PostgreSQL; without it everything lives in memory,
    // which is enough for local development.
    let app_state = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");
            info!("Connected to PostgreSQL");

            AppState::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresServanteeRepository::new(pool.clone())),
                Arc::new(PostgresRetreatRepository::new(pool.clone())),
                Arc::new(PostgresNoteRepository::new(pool)),
                tokens,
            )
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory repositories");

            AppState::new(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryServanteeRepository::new()),
                Arc::new(InMemoryRetreatRepository::new()),
                Arc::new(InMemoryNoteRepository::new()),
                tokens,
            )
        }
    };

    // Lock CORS down to the configured frontend origin when one is given
    let cors = match std::env::var("FRONTEND_ORIGIN") {
        Ok(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .expect("FRONTEND_ORIGIN is not a valid origin"),
            )
            .allow_methods(Any)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        Err(_) => CorsLayer::permissive(),
    };

    let app = outreach::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
