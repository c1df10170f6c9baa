use dotenvy::dotenv;
use homeroom::logging::{init_tracing, shutdown_tracer};
use homeroom::metrics::{init_metrics, metrics_app};
use homeroom::router::init_router;
use homeroom::state::init_app_state;
use homeroom_config::ServerConfig;
use homeroom_db::run_migrations;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let server_config = ServerConfig::from_env();
    let state = init_app_state().await;
    run_migrations(&state.db).await?;

    if let Some(handle) = init_metrics() {
        let metrics_addr = server_config.metrics_addr();
        let listener = tokio::net::TcpListener::bind(&metrics_addr).await?;
        info!("Metrics available at http://{}/metrics", metrics_addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let app = init_router(state);
    let addr = server_config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
