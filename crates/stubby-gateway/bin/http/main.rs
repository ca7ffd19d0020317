use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stubby_core::{Clock, SystemClock};
use stubby_gateway::access_log::AccessLogSink;
use stubby_gateway::config::Cli;
use stubby_gateway::{telemetry, App, AppState};
use stubby_generator::RandomGenerator;
use stubby_store::ShortcodeStore;
use tracing::{info, warn};

const ACCESS_LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();
    telemetry::init(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        default_validity_minutes = config.default_validity_minutes.get(),
        code_length = config.code_length,
        access_log = %config.access_log_path.display(),
        "starting stubby gateway"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let generator = RandomGenerator::new(config.code_length).context("invalid code length")?;
    let store = ShortcodeStore::with_clock(generator, clock.clone(), config.store_settings());

    let (access_log, writer) =
        AccessLogSink::spawn(config.access_log_path.clone(), config.access_log_capacity);

    let cors_origin =
        HeaderValue::from_str(&config.cors_origin).context("invalid CORS origin")?;
    let state = AppState::new(Arc::new(store), clock, config.base_url.clone())
        .with_access_log(access_log);
    let app = App::router(state).layer(App::cors(cors_origin));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // the router held the last senders; the writer drains what is queued and exits
    if tokio::time::timeout(ACCESS_LOG_DRAIN_TIMEOUT, writer)
        .await
        .is_err()
    {
        warn!("access log writer did not finish in time");
    }

    info!("stubby gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
