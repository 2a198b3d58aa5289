use std::net::SocketAddr;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use krishi_backend::{
    config::Config,
    db,
    entities::user::{self, UserRole},
    middleware::rate_limit::{create_global_governor, log_request},
    routes,
    utils::password::hash_password,
    AppResult, AppState, DiseaseClient,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "krishi_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    seed_admin(&db, &config)
        .await
        .expect("Failed to seed admin account");

    let disease = DiseaseClient::new(&config).expect("Failed to build disease model client");

    let state = AppState {
        db,
        config: config.clone(),
        disease,
    };

    let app = routes::create_router(state)
        .layer(axum::middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor());

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Create the admin account from ADMIN_EMAIL / ADMIN_PASSWORD if both are set
/// and no account with that email exists yet
async fn seed_admin(db: &sea_orm::DatabaseConnection, config: &Config) -> AppResult<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed");
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let admin = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(password)?),
        name: Set("Admin".to_string()),
        phone: Set(String::new()),
        role: Set(UserRole::Admin),
        is_active: Set(true),
        ..Default::default()
    };

    admin.insert(db).await?;
    tracing::info!("Admin account created: {}", email);

    Ok(())
}
