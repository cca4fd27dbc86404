use homework_upload::{AppConfig, StoreDispatcher, router};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let dispatcher = StoreDispatcher::from_config(&config.storage);
    tracing::info!(
        strategy = dispatcher.strategy(),
        bucket = %config.storage.bucket,
        "storage configured"
    );

    let app = router(Arc::new(dispatcher), config.max_upload_bytes);

    let addr = config.socket_addr()?;
    tracing::info!("Server running on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
