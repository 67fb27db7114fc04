//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! This binary reads `CommandEnvelope` messages as newline-delimited JSON
//! from stdin, dispatches them to a search session, and writes
//! `ResponseEnvelope` and `EventEnvelope` messages to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use stackrank::config::StackrankConfig;
use stackrank::driver::SessionDriver;
use stackrank::host::stdio::run_stdio_bridge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing to stderr only (stdout is reserved for the JSON
    // protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stackrank=info")),
        )
        .init();

    tracing::info!("stackrank-host starting");

    let config_path = StackrankConfig::default_config_path();
    let config = StackrankConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config_path.display()))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;

    let gateway = stackrank_gateway::connect(config.backend.clone())
        .map_err(|e| anyhow::anyhow!("failed to build backend client: {e}"))?;
    tracing::info!(api_root = %gateway.api_root(), "backend configured");

    let driver = SessionDriver::new(gateway, &config);
    // Resolves in the background; the ranked view stays locked until then.
    let _probe = driver.spawn_capability_probe();

    run_stdio_bridge(driver).await.map_err(|e| {
        tracing::error!(error = %e, "stackrank-host exited with error");
        anyhow::anyhow!("stackrank-host failed: {e}")
    })?;

    tracing::info!("stackrank-host shut down cleanly");
    Ok(())
}
