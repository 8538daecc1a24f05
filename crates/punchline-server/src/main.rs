use punchline::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let prompts = load_prompts(&config.prompt_file).await?;

    let server = PunchlineServer::builder()
        .bind(&config.bind_addr())
        .game_config(config.game.clone())
        .prompts(prompts)
        .idle_timeout(config.idle_timeout)
        .build()
        .await?;

    server.run_until(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
