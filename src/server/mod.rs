//! HTTP surface
//!
//! Upload endpoints backed by [`ReportPipeline`], generated images under
//! `/graphs` and the static upload page for everything else.

pub mod handlers;
pub mod pipeline;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::core::constants::http;
use crate::core::error::Result;
use crate::reporting::logging;

// Re-export commonly used items
pub use handlers::{AppState, receive_capture};
pub use pipeline::ReportPipeline;

/// Routes for the upload endpoints and both static roots
pub fn router(pipeline: ReportPipeline, config: &Config) -> Router {
    let body_limit = match config.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route(http::UPLOAD_ROUTE, post(handlers::upload_pcap))
        .route(http::UPLOAD_REPORT_ROUTE, post(handlers::upload_pcap_report))
        .nest_service(http::GRAPHS_ROUTE, ServeDir::new(config.graphs_path()))
        .fallback_service(ServeDir::new(config.public_path()))
        .layer(body_limit)
        .with_state(Arc::new(pipeline))
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let listener = TcpListener::bind(config.socket_address()).await?;
    serve_on(listener, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_on<F>(listener: TcpListener, config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let pipeline = ReportPipeline::from_config(config);
    pipeline.prepare().await?;

    logging::log_config_info(config);
    logging::log_server_start(&listener.local_addr()?.to_string());

    axum::serve(listener, router(pipeline, config))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logging::log_warning(&format!("Could not listen for Ctrl-C: {e}"));
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
