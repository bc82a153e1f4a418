use std::net::SocketAddr;

use taskwise_server::{app, config::Settings, state};

fn init_tracing() {
    #[cfg(feature = "profile-console")]
    {
        console_subscriber::init();
    }

    #[cfg(not(feature = "profile-console"))]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    // ── Boot the World ─────────────────────────────────────────
    let settings = Settings::load()?;
    let addr: SocketAddr =
        format!("{}:{}", settings.tcp_socket_binding, settings.tcp_socket_port).parse()?;
    let state = state::boot(settings)?;

    // ── Start ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, dev_mode = state.settings.dev_mode, "server running");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
