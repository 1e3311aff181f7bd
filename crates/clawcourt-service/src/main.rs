use clap::Parser;
use clawcourt_core::DEFAULT_APPROVAL_THRESHOLD;
use clawcourt_service::{build_router, ServiceConfig, ServiceState};
use std::net::SocketAddr;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "clawcourtd", version, about = "Claw Court governance REST service")]
struct Cli {
    /// Socket address to bind, e.g. 127.0.0.1:8090
    #[arg(long, default_value = "127.0.0.1:8090", env = "CLAWCOURT_LISTEN")]
    listen: SocketAddr,
    /// Karma needed to approve an Inquisition.
    #[arg(long, default_value_t = DEFAULT_APPROVAL_THRESHOLD, env = "CLAWCOURT_APPROVAL_THRESHOLD")]
    approval_threshold: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "clawcourt_service=info,info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let state = ServiceState::bootstrap(ServiceConfig {
        approval_threshold: cli.approval_threshold,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(
        "clawcourt-service listening on {} (approval threshold {})",
        listener.local_addr()?,
        cli.approval_threshold
    );
    axum::serve(listener, app).await?;

    Ok(())
}
