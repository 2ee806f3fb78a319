use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use nutrigpt_client::config::GeminiConfig;
use nutrigpt_client::http_client::ReqwestGeminiClient;
use nutrigpt_server::config::{ServerConfig, env_filter};
use nutrigpt_server::http::api_router;
use nutrigpt_server::{AppState, FileStore, MemoryStore, Store, SystemClock};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = ServerConfig::from_env()?;
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&config.log_filter))
        .init();
    info!(log_filter = %config.log_filter, "nutrigpt: log filter");

    let metrics = PrometheusBuilder::new().install_recorder()?;

    let gemini = GeminiConfig::from_env()?;
    info!(model = %gemini.model, base_url = %gemini.base_url, "generator configured");
    let client = ReqwestGeminiClient::new(&gemini)?;

    let store: Arc<dyn Store> = match &config.data_dir {
        Some(dir) => {
            let store = FileStore::open(dir)?;
            info!(data_dir = %store.root().display(), "using file store");
            Arc::new(store)
        }
        None => {
            info!("NUTRIGPT_DATA_DIR not set; data is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let state = Arc::new(AppState::with_client(store, client, Arc::new(SystemClock)));

    let app = api_router()
        .route(
            "/metrics",
            get(move || {
                let metrics = metrics.clone();
                async move {
                    (
                        [("content-type", "text/plain; version=0.0.4")],
                        metrics.render(),
                    )
                }
            }),
        )
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.address).await?;
    info!(
        addr = %config.address,
        max_body_bytes = config.max_body_size,
        "starting HTTP server"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl+c; running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("server stopped");
    Ok(())
}
