use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mlgate_core::{
    load_config, load_schema, validate_config, Config, FsObjectStore, JsonDocumentSource,
    ObjectStore, RunStore, SourceConnector, SqliteRunStore, TrainingPipeline,
};
use mlgate_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let command = std::env::args().nth(1).unwrap_or_else(|| "serve".to_string());

    // Determine config path
    let config_path = std::env::var("MLGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("mlgate.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config)?;
    info!("Configuration loaded from {:?}", config_path);

    // Compute config hash so runs can be tied back to the exact settings
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(config_hash = &config_hash[..16], "Configuration validated");

    // Connection handles, built once and shared by every run
    let schema = load_schema(&config.pipeline.schema_path)
        .with_context(|| format!("Failed to load schema from {:?}", config.pipeline.schema_path))?;
    let source: Arc<dyn SourceConnector> = Arc::new(
        JsonDocumentSource::from_config(&config.source)
            .context("Failed to configure the document source")?,
    );
    let store: Arc<dyn ObjectStore> =
        Arc::new(FsObjectStore::new(&config.registry.root, &config.registry.bucket));
    let run_store: Arc<dyn RunStore> = Arc::new(
        SqliteRunStore::new(&config.state.path).context("Failed to open the run store")?,
    );
    info!(
        source = source.name(),
        store = store.name(),
        state = ?config.state.path,
        "Collaborators initialized"
    );

    let pipeline = TrainingPipeline::new(config.clone(), schema, source, store)
        .with_run_store(Arc::clone(&run_store));

    match command.as_str() {
        "train" => train_once(&pipeline).await,
        "serve" => serve(&config, pipeline, run_store).await,
        other => bail!("Unknown command '{}' (expected 'serve' or 'train')", other),
    }
}

/// Console output plus a per-process log file under the logs directory.
fn init_logging(config: &Config) -> Result<()> {
    let logs_dir = &config.pipeline.logs_dir;
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs directory {:?}", logs_dir))?;
    let log_path = logs_dir.join(format!("{}.log", config.pipeline.resolve_timestamp()));
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file {:?}", log_path))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

/// Run the pipeline once and exit non-zero unless it succeeded.
async fn train_once(pipeline: &TrainingPipeline) -> Result<()> {
    let report = pipeline.run().await.context("Training run failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.outcome.is_success() {
        bail!(
            "Training run ended with {}: {}",
            report.outcome,
            report.message.unwrap_or_default()
        );
    }
    Ok(())
}

async fn serve(
    config: &Config,
    pipeline: TrainingPipeline,
    run_store: Arc<dyn RunStore>,
) -> Result<()> {
    let state = Arc::new(AppState::new(pipeline, run_store));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
