//! Runs a Plaza server with the bundled lobby room.
//!
//! Environment: `PORT` (default 2567) and `JWT_SECRET` (optional; when
//! absent every client joins anonymously). `RUST_LOG` controls the log
//! filter.

use plaza::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        port = config.port,
        auth_configured = config.jwt_secret.is_some(),
        "starting Plaza"
    );

    if let Err(e) = serve(config).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let auth = ClaimsAuth::new(config.jwt_secret.clone());
    let server = PlazaServer::<LobbyRoom, ClaimsAuth>::builder()
        .config(config)
        .build(LobbyRoom, auth)
        .await?;
    server.run().await
}
