mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use infrastructure::{AppConfig, AppContainer};
use presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // tracing events are forwarded to `log`, so env_logger sees them too
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let container = AppContainer::new(&config).await?;

    let server = HttpServer::new(
        container.health_handler.clone(),
        container.job_handler.clone(),
        container.chat_handler.clone(),
        container.background_processor.clone(),
        config.server_port,
    );
    server.run().await
}
