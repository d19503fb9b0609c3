use anyhow::Context;
use clap::Parser;
use murmur_api::{config::MurmurApiConfig, server};
use murmur_db::storage;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MurmurApiConfig::parse();

    if !config.dump_openapi {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or("murmur_api=info,murmur_common=info,murmur_db=info".into()),
            )
            .pretty()
            .init();
    }

    // The OpenAPI document does not depend on the store.
    let database_url = if config.dump_openapi {
        storage::MEMORY_URL
    } else {
        config.database_url.as_str()
    };

    let db = storage::connect(database_url)
        .await
        .context("Failed to open the store")?;

    let (router, api) = server::make(config.clone(), db)?;

    if config.dump_openapi {
        let json = api.to_pretty_json()?;
        print!("{}", json);
        return Ok(());
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on http://{:?}", config.bind_addr);

    axum::serve(listener, router)
        .await
        .context("Failed to start server")?;

    Ok(())
}
