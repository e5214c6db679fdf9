//! HTTP server command.

use crate::config::Settings;
use crate::http::{router, AppState};
use crate::orchestrator::Orchestrator;
use crate::runner::TaskRunner;
use anyhow::Result;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub async fn serve(settings: Settings, host: &str, port: u16) -> Result<()> {
    let runner = TaskRunner::new(&settings.jobs);
    let orchestrator = Arc::new(Orchestrator::new(settings)?);
    let state = AppState {
        orchestrator,
        runner,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Starting server on {}", addr);
    println!("Referat server listening on http://{}", addr);
    println!("  GET  /health");
    println!("  GET  /meetings");
    println!("  POST /meetings");
    println!("  GET  /meetings/{{id}}");
    println!("  POST /agents/meeting-followup");
    println!("  POST /agents/supervisor/meeting-followup");
    println!("  GET  /agents/supervisor/health");

    axum::serve(listener, app).await?;
    Ok(())
}
