use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::messaging::{BackgroundProcessor, spawn_event_logger};
use crate::presentation::http::{
    handlers::{ChatHandler, HealthHandler, JobHandler},
    routes::{chat_routes, health_routes, job_routes},
};

/// Requests carry JSON only; documents are fetched by the workers.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct HttpServer {
    health_handler: Arc<HealthHandler>,
    job_handler: Arc<JobHandler>,
    chat_handler: Arc<ChatHandler>,
    background_processor: Arc<BackgroundProcessor>,
    port: u16,
}

pub fn build_router(
    health_handler: Arc<HealthHandler>,
    job_handler: Arc<JobHandler>,
    chat_handler: Arc<ChatHandler>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes(health_handler))
        .merge(job_routes(job_handler))
        .merge(chat_routes(chat_handler))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .on_request(
                    |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        tracing::info!("Received request: {} {}", request.method(), request.uri());
                    },
                )
                .on_response(
                    |response: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "Response: {} (took {} ms)",
                            response.status(),
                            latency.as_millis()
                        );
                    },
                )
                .on_failure(
                    |error: ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            "Request failed: {:?} (took {} ms)",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
}

impl HttpServer {
    pub fn new(
        health_handler: Arc<HealthHandler>,
        job_handler: Arc<JobHandler>,
        chat_handler: Arc<ChatHandler>,
        background_processor: Arc<BackgroundProcessor>,
        port: u16,
    ) -> Self {
        Self {
            health_handler,
            job_handler,
            chat_handler,
            background_processor,
            port,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Start background processor
        spawn_event_logger(self.background_processor.subscribe());
        let background_processor = self.background_processor.clone();
        tokio::spawn(async move {
            background_processor.start().await;
        });

        // Pick up whatever the previous process left behind
        if let Err(e) = self.background_processor.recover_pending_jobs().await {
            tracing::error!("Failed to recover pending jobs: {}", e);
        }

        let app = build_router(self.health_handler, self.job_handler, self.chat_handler);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
