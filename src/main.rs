use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snap3d::{config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging (stdout + daily file rotation under ./logs)
    std::fs::create_dir_all("logs").ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily("logs", "snap3d.log");
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Keep the guards alive so the non-blocking writers flush on exit
    let _log_guards = (stdout_guard, file_guard);

    // Load configuration (embedded defaults -> snap3d.toml -> env/.env)
    let app_cfg = config::load()?;

    std::fs::create_dir_all(&app_cfg.storage.scans_dir)?;

    let recon = &app_cfg.reconstruction;
    if recon.enabled() {
        info!("Reconstruction enabled via {}", recon.task_url);
        if recon.public_base_url().is_none() {
            warn!("No public base URL configured: multi-image scans fall back to the first image");
        }
    } else {
        info!("Reconstruction disabled: scans are served as photo-on-card models");
    }

    let port: u16 = app_cfg.server.port;
    let host: String = app_cfg.server.host.clone();
    let state = AppState::new(app_cfg)?;
    let app = routes::build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen addr {}:{} - {}", host, port, e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Snap3D listening on http://{}", listener.local_addr()?);
    info!("API: POST /api/create-model (multipart field \"images\")");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
