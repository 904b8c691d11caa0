//! Orderdesk API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use orderdesk_api::config::ApiConfig;
use orderdesk_api::AppState;
use orderdesk_core::auth::password::hash_password;
use orderdesk_core::store::memory::MemoryStore;
use orderdesk_core::store::postgres::PgStore;
use orderdesk_core::store::DynStore;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "orderdesk_server", about = "Orderdesk API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind_addr: String,

    /// PostgreSQL connection URL. When absent the server runs on the
    /// in-memory store (data is lost on restart).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

/// Create the default users when they don't exist yet.
async fn seed_default_users(store: &DynStore) -> Result<(), Box<dyn std::error::Error>> {
    if store.find_user_by_username("admin").await?.is_none() {
        let hash = hash_password("admin")?;
        store
            .create_user("admin", &hash, Some("admin@example.com"), &["ADMIN".into()])
            .await?;
        info!("admin user created: username=admin");
    }
    if store.find_user_by_username("user").await?.is_none() {
        let hash = hash_password("password")?;
        store
            .create_user("user", &hash, Some("user@example.com"), &["USER".into()])
            .await?;
        info!("standard user created: username=user");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orderdesk_api=debug,orderdesk_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let store: DynStore = match &args.database_url {
        Some(url) => {
            info!(max_connections = args.max_connections, "connecting to PostgreSQL");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(url)
                .await?;

            info!("running database migrations");
            orderdesk_core::migrate::migrate(&pool).await?;

            Arc::new(PgStore::new(pool))
        }
        None => {
            info!("no DATABASE_URL set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    seed_default_users(&store).await?;

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        database_url: args.database_url,
        jwt_secret: orderdesk_core::auth::jwt::resolve_jwt_secret(),
    };

    let state = AppState::new(store, config.clone());
    let app = orderdesk_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
