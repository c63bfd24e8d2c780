//! # Taskflow API Server
//!
//! Task management REST API with role-based access, in-app notifications,
//! email delivery and dashboard analytics.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskflow \
//! JWT_SECRET=change-me-to-something-at-least-32-bytes \
//! cargo run -p taskflow-api
//! ```

use std::sync::Arc;
use taskflow_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskflow_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool},
    },
    mail::{logging::LogMailer, smtp::SmtpMailer, Mailer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskflow_api=debug,taskflow_shared=debug,tower_http=debug".into()
    });

    if config.log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        "Taskflow API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(config.database.pool_config()).await?;
    run_migrations(&pool).await?;

    let mailer: Arc<dyn Mailer> = match config.mail.smtp() {
        Some(smtp) => Arc::new(SmtpMailer::new(&smtp)?),
        None => {
            tracing::warn!("SMTP_HOST not set, emails will only be logged");
            Arc::new(LogMailer::new())
        }
    };
    tracing::info!(mailer = mailer.name(), "Mail transport ready");

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
