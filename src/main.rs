//! Leafgate HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use leafgate::clearance::ClearanceClient;
use leafgate::concepts::ConceptBank;
use leafgate::config::Config;
use leafgate::embedding::ClipEncoder;
use leafgate::gateway::{HandlerState, create_router_with_state};
use leafgate::scoring::SimilarityScorer;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        auth_mode = %config.auth_mode,
        scoring_mode = %config.scoring_mode,
        threshold = config.resolved_threshold(),
        "Leafgate starting"
    );

    std::fs::create_dir_all(&config.spool_path)?;

    if config.model_path.is_none() {
        tracing::warn!("No LEAFGATE_MODEL_PATH configured, running encoder in stub mode");
    }
    let encoder = Arc::new(ClipEncoder::load(config.encoder_config())?);

    let concepts = Arc::new(ConceptBank::build(
        &encoder,
        config.concept_prompts.clone(),
    )?);

    let scorer = Arc::new(SimilarityScorer::new(
        config.scoring_mode,
        config.resolved_threshold(),
    )?);

    let clearance = Arc::new(ClearanceClient::new(config.clearance.clone())?);

    let state = HandlerState::new(
        encoder,
        concepts,
        scorer,
        clearance,
        config.static_token.clone(),
        config.spool_path.clone(),
    );

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Leafgate shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("LEAFGATE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    rt.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .expect("failed to build client");

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
