use chronos_gateway::{AppError, AppState, Args, build_router};
use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    // parse cli arguments (env vars as fallback)
    let args = Args::parse();

    let port = args.port().inspect_err(|e| error!("{e}"))?;
    let state = AppState::from_args(&args).inspect_err(|e| error!("{e}"))?;
    let limits = state.rate_limiter.config();
    let app_name = state.app_name.clone();
    let app = build_router(Arc::new(state));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })
        .inspect_err(|e| error!("{e}"))?;

    info!("{} running on port {}", app_name, port);
    info!(timezone = args.timezone(), "serving time");
    info!(
        "Rate limit: {} requests per {} seconds",
        limits.max_requests,
        limits.window.as_secs()
    );

    // peer address is needed by the rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}
