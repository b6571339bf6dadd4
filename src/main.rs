use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboardd::api::{self, AppState};
use dashboardd::config::Config;
use dashboardd::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboardd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let conn = db::open_db(&cfg.database)
        .with_context(|| format!("open database {}", cfg.database.display()))?;
    if !cfg.dataset.is_file() {
        tracing::warn!(path = %cfg.dataset.display(), "dataset not found; analytics routes will answer 404");
    }
    let app = api::router(AppState::new(conn, cfg.dataset.clone()));

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    tracing::info!(addr = %cfg.bind, database = %cfg.database.display(), "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
