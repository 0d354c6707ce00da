// # zonesyncd - Zone Synchronization Daemon
//
// Thin integration layer around `zonesync-core`. No reconciliation, DNS or
// retry logic lives here.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Setting up logging
// 3. Registering the compiled-in backends
// 4. Running the reconciliation loop until it terminates or a signal arrives
//
// ## Configuration
//
// ### Loop
// - `ZONESYNC_REGISTRAR`: Registrar type (akamai, file)
// - `ZONESYNC_INSTANCE`: Tally key (default: registrar type)
// - `ZONESYNC_INTERVAL_SECS`: Seconds between cycles (default 900)
// - `ZONESYNC_DRY_RUN`, `ZONESYNC_ONCE`, `ZONESYNC_FAIL_ON_ERROR`
// - `ZONESYNC_DNSSEC`, `ZONESYNC_TSIG`: Attach signing and transfer keys
//
// ### Edge DNS
// - `ZONESYNC_EDGEDNS_CONTRACT`, `ZONESYNC_EDGEDNS_GROUP`: Placement of new zones
// - `ZONESYNC_EDGEGRID_HOST`, `ZONESYNC_EDGEGRID_CLIENT_TOKEN`,
//   `ZONESYNC_EDGEGRID_CLIENT_SECRET`, `ZONESYNC_EDGEGRID_ACCESS_TOKEN`
// - `ZONESYNC_EDGEGRID_EDGERC_PATH`, `ZONESYNC_EDGEGRID_EDGERC_SECTION`
//
// ### Registrars
// - `ZONESYNC_AKAMAI_CONTRACTS`, `ZONESYNC_AKAMAI_NAME_FILTER`
// - `ZONESYNC_REGISTRAR_EDGEGRID_*`: Same keys as `ZONESYNC_EDGEGRID_*`, for an
//   Akamai registrar on a different account (default: the Edge DNS credentials)
// - `ZONESYNC_FILE_DOMAINS_PATH`, `ZONESYNC_FILE_MASTER_IPS`,
//   `ZONESYNC_FILE_REFRESH_SECS`
//
// ### Logging
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `ZONESYNC_LOG_FORMAT`: text or json (default text)
// - `ZONESYNC_LOG_FILE`: Append logs to this file instead of stdout
//
// ## Example
//
// ```bash
// export ZONESYNC_REGISTRAR=akamai
// export ZONESYNC_AKAMAI_CONTRACTS=1-ABCDE
// export ZONESYNC_EDGEDNS_CONTRACT=1-ABCDE
// export ZONESYNC_EDGEDNS_GROUP=12345
// export ZONESYNC_EDGEGRID_EDGERC_PATH=/etc/zonesync/.edgerc
// export ZONESYNC_DRY_RUN=true
//
// zonesyncd
// ```

mod config;

use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Result;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use zonesync_core::{BackendRegistry, Outcome, ZoneSyncEngine};

use crate::config::{Config, LogFormat};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for the ways the daemon terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Single cycle completed
    Completed = 0,
    /// Configuration or startup error
    ConfigError = 1,
    /// Stopped by a signal
    Interrupted = 2,
    /// The loop terminated on an error
    Fatal = 3,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&Outcome> for ZonesyncExitCode {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Finished => ZonesyncExitCode::Completed,
            Outcome::Cancelled => ZonesyncExitCode::Interrupted,
            Outcome::Failed { .. } => ZonesyncExitCode::Fatal,
        }
    }
}

impl ZonesyncExitCode {
    /// Exit code for `outcome`, given whether a signal arrived first
    ///
    /// A `once` cycle runs to completion even when a signal arrives during
    /// it; the signal still decides the exit code.
    fn for_outcome(outcome: &Outcome, signalled: bool) -> Self {
        match (Self::from(outcome), signalled) {
            (ZonesyncExitCode::Completed, true) => ZonesyncExitCode::Interrupted,
            (code, _) => code,
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation failed: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("{:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::Fatal.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Install the global tracing subscriber
fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.to_lowercase())
        .map_err(|e| anyhow::anyhow!("Invalid log level {}: {}", config.log_level, e))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let writer = match &config.log_file {
        Some(path) => Some(Mutex::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path, e))?,
        )),
        None => None,
    };

    let result = match (config.log_format, writer) {
        (LogFormat::Json, Some(file)) => builder.json().with_ansi(false).with_writer(file).try_init(),
        (LogFormat::Json, None) => builder.json().try_init(),
        (LogFormat::Text, Some(file)) => builder.with_ansi(false).with_writer(file).try_init(),
        (LogFormat::Text, None) => builder.try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Run the daemon until the loop reports its outcome
async fn run_daemon(config: Config) -> ZonesyncExitCode {
    let registry = BackendRegistry::new();

    #[cfg(feature = "edgedns")]
    {
        info!("Registering Edge DNS provider and Akamai registrar");
        zonesync_edgedns::register(&registry);
    }

    #[cfg(feature = "file")]
    {
        info!("Registering file registrar");
        zonesync_registrar_file::register(&registry);
    }

    let coordinator = config.to_coordinator();
    info!(
        "Instance {}: registrar {}, Edge DNS contract {} group {}",
        coordinator.sync.instance,
        coordinator.registrar.type_name(),
        coordinator.sync.placement.contract_id,
        coordinator.sync.placement.group_id
    );
    if coordinator.sync.dry_run {
        warn!("Dry run: no zones will be created or removed");
    }

    let registrar = match registry.create_registrar(&coordinator.registrar) {
        Ok(registrar) => registrar,
        Err(e) => {
            error!(
                "Failed to create registrar (available: {:?}): {}",
                registry.list_registrars(),
                e
            );
            return ZonesyncExitCode::ConfigError;
        }
    };
    let edge_dns = match registry.create_edge_dns(&coordinator.edge_dns) {
        Ok(edge_dns) => edge_dns,
        Err(e) => {
            error!(
                "Failed to create Edge DNS provider (available: {:?}): {}",
                registry.list_edge_dns(),
                e
            );
            return ZonesyncExitCode::ConfigError;
        }
    };

    let (engine, mut events) = match ZoneSyncEngine::new(registrar, edge_dns, coordinator.sync) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Failed to create engine: {}", e);
            return ZonesyncExitCode::ConfigError;
        }
    };

    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (handle, mut outcome_rx) = engine.spawn(Some(shutdown_rx));

    let mut signalled = false;
    let outcome = tokio::select! {
        outcome = &mut outcome_rx => outcome,
        signal = wait_for_signal() => {
            match signal {
                Ok(name) => {
                    info!("Received {}, stopping", name);
                    signalled = true;
                    if shutdown_tx.send(()).is_err() {
                        debug!("Loop already terminated");
                    }
                }
                Err(e) => error!("Signal handling unavailable: {}", e),
            }
            outcome_rx.await
        }
    };

    if let Err(e) = handle.await {
        error!("Reconciliation task failed: {}", e);
    }
    event_log.abort();

    match outcome {
        Ok(outcome) => {
            match &outcome {
                Outcome::Failed { reason } => error!("zonesyncd stopped on error: {}", reason),
                other => info!("zonesyncd stopped: {:?}", other),
            }
            ZonesyncExitCode::for_outcome(&outcome, signalled)
        }
        Err(_) => {
            error!("Reconciliation loop ended without an outcome");
            ZonesyncExitCode::Fatal
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
