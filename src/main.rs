use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plenticore_link::{Config, DeviceClient, DeviceError, ModuleQuery};

/// Talk to a KOSTAL PLENTICORE inverter on the local network.
#[derive(Debug, Parser)]
#[command(name = "plenticore", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the session handshake once.
    Auth {
        /// Print the session id (it is a bearer credential).
        #[arg(long)]
        show_session: bool,
    },
    /// Read process data once, e.g. `devices:local/Dc_P,Home_P`.
    Read {
        #[arg(required = true, value_parser = parse_selector)]
        selectors: Vec<ModuleQuery>,
    },
    /// Read process data every `refresh_interval_secs` until interrupted.
    Watch {
        #[arg(required = true, value_parser = parse_selector)]
        selectors: Vec<ModuleQuery>,
    },
}

fn parse_selector(s: &str) -> Result<ModuleQuery, String> {
    ModuleQuery::parse(s).ok_or_else(|| format!("expected <module>/<id>[,<id>...], got '{s}'"))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("plenticore=debug,plenticore_link=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("plenticore=info,plenticore_link=info"))
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path().context("Could not determine the config directory")?,
    };
    Config::load(&path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config)?;
    let client = DeviceClient::new(&config.device)?;

    match cli.command {
        Command::Auth { show_session } => {
            let session = client.authenticate().await?;
            println!("authenticated (transaction {})", session.transaction_id());
            if show_session {
                println!("session: {}", session.session_id());
            }
        }
        Command::Read { selectors } => read_once(&client, &selectors).await?,
        Command::Watch { selectors } => {
            let interval = Duration::from_secs(config.device.refresh_interval_secs);
            watch(&client, &selectors, interval).await?;
        }
    }

    Ok(())
}

async fn read_once(client: &DeviceClient, selectors: &[ModuleQuery]) -> Result<(), DeviceError> {
    for module in client.process_data(selectors).await? {
        for value in module.values {
            match value.unit {
                Some(unit) => println!("{}/{} = {} {unit}", module.module_id, value.id, value.value),
                None => println!("{}/{} = {}", module.module_id, value.id, value.value),
            }
        }
    }
    Ok(())
}

/// Transient failures are logged and retried on the next tick; anything that
/// needs user action ends the loop.
async fn watch(client: &DeviceClient, selectors: &[ModuleQuery], interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                match read_once(client, selectors).await {
                    Ok(()) => {}
                    Err(e) if e.is_transient() => {
                        tracing::warn!("Read failed, retrying next interval: {e}");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}
