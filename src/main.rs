use shared_todo::{
    AuthSettings, Notifier, TodoService, build_router,
    config::CONFIG,
    infrastructure::{
        mailer::{Mailer, log::LogMailer, resend::ResendMailer},
        storage::{Storage, in_memory::InMemoryStorage, postgres::PostgresStorage},
    },
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = &*CONFIG;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .init();
    info!("Loaded {:?}", config);

    let storage: Arc<dyn Storage> = match &config.database_url {
        Some(url) => {
            let postgres = PostgresStorage::connect(url).await?;
            postgres.migrate().await?;
            info!("Database connection established");
            Arc::new(postgres)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory storage; data is lost on restart");
            Arc::new(InMemoryStorage::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(&config.resend_api_url, key, &config.mail_from)),
        None => {
            warn!("RESEND_API_KEY not set, magic links will be logged instead of emailed");
            Arc::new(LogMailer)
        }
    };

    let auth = AuthSettings {
        admin_email: config.admin_email.clone(),
        magic_link_url: config.magic_link_url.clone(),
    };
    let service = Arc::new(TodoService::new(storage, mailer, Notifier::new(), auth));
    let app = build_router(service, Some(Path::new(&config.static_dir)));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
