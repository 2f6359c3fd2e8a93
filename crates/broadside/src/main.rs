use broadside::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), BroadsideError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = ServerConfig::from_env()?;
    let server = BroadsideServer::builder().config(config).build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested");
        })
        .await
}
