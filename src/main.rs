//! panelgate - open isolated panels through a signed-capability gateway
//!
//! On startup the shell:
//! 1. Generates the process Ed25519 keypair from the OS RNG
//! 2. Logs the base64 public key
//! 3. For each URL given, runs the userland flow: sign, request, open
//! 4. Prints one machine-readable line per outcome

use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use panelgate::config::{DEFAULT_LOG_FILTER, DEFAULT_MAX_PANELS};
use panelgate::{IdentityStore, OpenOutcome, Shell, ShellConfig, Userland};

#[derive(Debug, Parser)]
#[command(name = "panelgate", version, about)]
struct Cli {
    /// URLs to open, one panel each
    urls: Vec<String>,

    /// Maximum simultaneously open panels (0 = unlimited)
    #[arg(long, env = "PANELGATE_MAX_PANELS", default_value_t = DEFAULT_MAX_PANELS)]
    max_panels: usize,

    /// Log filter directive
    #[arg(long, env = "PANELGATE_LOG", default_value = DEFAULT_LOG_FILTER)]
    log: String,

    /// Do not log the public key at startup
    #[arg(long)]
    quiet_key: bool,
}

impl From<Cli> for ShellConfig {
    fn from(cli: Cli) -> Self {
        Self {
            log_filter: cli.log,
            max_panels: cli.max_panels,
            announce_public_key: !cli.quiet_key,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let urls = cli.urls.clone();
    let config = ShellConfig::from(cli);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();

    info!("panelgate v{} starting", env!("CARGO_PKG_VERSION"));

    // No degraded mode: a dead entropy source stops startup here
    let identity = Arc::new(IdentityStore::initialize()?);
    let shell = Shell::with_config(identity, &config);
    let userland = Userland::new(&shell);

    if urls.is_empty() {
        warn!("no URLs given - nothing to open");
    }

    for url in &urls {
        match userland.open(url) {
            Ok(outcome) => output_outcome(url, &outcome),
            Err(e) => {
                warn!("Error opening panel: {}", e);
                println!("{}", serde_json::json!({ "input": url, "error": e.to_string() }));
            }
        }
    }

    let closed = shell.host().close_all();
    info!("closed {} panel(s), exiting", closed);
    Ok(())
}

/// Output one outcome (machine-readable, one JSON object per line)
fn output_outcome(input: &str, outcome: &OpenOutcome) {
    let line = match outcome {
        OpenOutcome::Opened {
            panel,
            resource_locator,
        } => serde_json::json!({ "input": input, "panel": panel.to_string(), "url": resource_locator }),
        OpenOutcome::Denied(reason) => {
            serde_json::json!({ "input": input, "denied": reason.to_string() })
        }
    };
    println!("{line}");
}
