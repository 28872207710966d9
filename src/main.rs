use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

use trackit_poller::api::logging::init_tracing;
use trackit_poller::api::terminal::{TerminalNotifier, TerminalRenderer};
use trackit_poller::config::{PollerConfig, TickOverlap};
use trackit_poller::engine::controller::{ControllerState, PollingController};
use trackit_poller::source::http_source::HttpShipmentSource;

/// Look up a shipment and follow its status until interrupted.
#[derive(Debug, Parser)]
#[command(name = "trackit", version)]
struct Cli {
    /// Tracking id (trimmed and uppercased before use).
    tracking_id: String,

    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "TRACKIT_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "TRACKIT_POLL_INTERVAL_MS")]
    interval_ms: Option<u64>,

    #[arg(long, env = "TRACKIT_REQUEST_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Skip a tick while the previous request is still outstanding.
    #[arg(long)]
    skip_overlap: bool,

    /// Print the lookup result and exit without polling.
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn poller_config(&self) -> Result<PollerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                PollerConfig::from_json(&text)?
            }
            None => PollerConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout_ms = ms;
        }
        if self.skip_overlap {
            config.tick_overlap = TickOverlap::SkipIfInFlight;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.poller_config()?;

    let source = Arc::new(HttpShipmentSource::new(&config)?);
    let controller = PollingController::new(
        source,
        Arc::new(TerminalRenderer),
        Arc::new(TerminalNotifier),
        config,
    );

    controller
        .start_lookup(&cli.tracking_id)
        .await
        .map_err(|e| anyhow!("lookup failed ({}): {}", e.kind, e.message))?;

    if cli.once {
        controller.stop();
        return Ok(());
    }

    let mut state = controller.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, stopping");
            controller.stop();
        }
        _ = state.wait_for(|s| *s == ControllerState::Idle) => {}
    }

    let stats = controller.stats();
    info!(
        "ticks issued={} applied={} discarded={} skipped={} changes={}",
        stats.ticks_issued,
        stats.ticks_applied,
        stats.ticks_discarded,
        stats.ticks_skipped,
        stats.changes_emitted
    );

    match controller.last_error() {
        Some(err) => Err(anyhow!("polling stopped ({}): {}", err.kind, err.message)),
        None => Ok(()),
    }
}
