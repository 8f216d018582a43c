//! Community chat gateway binary
//!
//! Reads everything from the environment (a `.env` file works for local
//! runs) and serves the room until the process stops.

use agora_common::{try_init_tracing, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Fold in .env before tracing reads APP_ENV
    let _ = dotenvy::dotenv();

    if let Err(e) = try_init_tracing() {
        eprintln!("tracing setup failed: {e}");
    }

    let config = AppConfig::from_env()?;
    info!(
        name = %config.app.name,
        env = ?config.app.env,
        addr = %config.gateway.address(),
        "starting community gateway"
    );

    agora_gateway::run(config).await?;
    Ok(())
}
