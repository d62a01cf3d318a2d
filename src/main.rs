use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use menu_today::{
    catalog::Catalog,
    config::Config,
    db::{create_redis_client, KeyValueStore, MemoryStore, RedisStore},
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menu_today=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let settings = config.recommend_settings()?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin()?,
    };
    tracing::info!(items = catalog.len(), "Loaded menu catalog");

    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::new(create_redis_client(url)?)),
        None => {
            tracing::warn!("REDIS_URL not set, device state will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!(backend = store.name(), "Device state store ready");

    let app = create_router(AppState::new(catalog, store, settings));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server running on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
