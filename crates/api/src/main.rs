use std::sync::Arc;

use anyhow::Context;

use stockroom_api::app::{build_app, AppServices};
use stockroom_infra::config::AppConfig;
use stockroom_infra::seed::seed_demo_data;
use stockroom_infra::store::{InMemoryStore, PostgresStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            tracing::info!(max_connections = config.db_max_connections, "using Postgres store");
            serve(config, store).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            serve(config, InMemoryStore::new()).await
        }
    }
}

async fn serve<S: Store>(config: AppConfig, store: S) -> anyhow::Result<()> {
    let services = Arc::new(AppServices::new(Arc::new(store)));

    if config.seed {
        let report = seed_demo_data(&services.catalog)
            .await
            .context("failed to seed demo data")?;
        tracing::info!(?report, "seed finished");
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, build_app(services)).await?;
    Ok(())
}
