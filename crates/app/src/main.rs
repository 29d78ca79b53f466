//! Courier - command-line entry point.
//!
//! Loads the persisted workspace, honours an optional launch context given
//! as the first argument (e.g. `logId=abc123`), optionally sends the active
//! tab, and prints a JSON summary of the workspace.

use courier::{AppConfig, has_workspace, start};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Logs go to stderr; stdout carries the summary.
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Courier v{}", env!("CARGO_PKG_VERSION"));
    if !has_workspace(&config.data_dir) {
        info!(dir = %config.data_dir.display(), "no workspace yet, starting empty");
    }

    let mut courier = start(&config).await?;

    if let Some(context) = std::env::args().nth(1)
        && !courier.session.handle_launch_context(&context).await?
    {
        warn!(context = %context, "launch context did not name a captured request");
    }

    if config.send_active {
        match courier.session.send_active().await? {
            Some(tab) => info!(tab = %tab.id, status = ?tab.status(), "sent active tab"),
            None => warn!("active tab has no request to send"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&courier.summary())?);
    Ok(())
}
