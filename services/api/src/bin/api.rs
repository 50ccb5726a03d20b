//! services/api/src/bin/api.rs

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutors_api::{
    adapters::DbAdapter,
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, AppState},
};
use mockable::DefaultClock;
use tutors_core::domain::UserProfile;
use tutors_core::memory::InMemoryDatabase;
use tutors_core::DatabaseService;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage ---
    let db: Arc<dyn DatabaseService> = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart.");
            let memory = InMemoryDatabase::new();
            if let Some(token) = &config.dev_session_token {
                let user_id = Uuid::new_v4();
                memory
                    .insert_user(UserProfile {
                        id: user_id,
                        display_name: "Developer".to_string(),
                        email: None,
                        avatar_url: None,
                    })
                    .await;
                memory.insert_auth_session(token, user_id).await;
                info!("Seeded development user {} with the configured session token", user_id);
            }
            Arc::new(memory)
        }
    };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(db, config.clone(), Arc::new(DefaultClock)));

    // --- 4. Create the Web Router ---
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
