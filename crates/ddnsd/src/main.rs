// # ddnsd - DDNS Daemon
//
// Keeps one Cloudflare A record pointed at this host's public IPv4 address.
//
// This is a THIN integration layer: all DDNS logic lives in ddns-core and
// the collaborator crates. The daemon is responsible for:
// 1. Loading the env file and reading configuration
// 2. Initializing logging and the runtime
// 3. Building the IP source and the provider
// 4. Running the engine until SIGINT/SIGTERM
//
// ## Configuration
//
// All configuration is done via environment variables, optionally seeded
// from an env file (`.env` by default, see `DDNS_ENV_FILE`). Variables
// already set in the environment take precedence over the file.
//
// ### Schedule
// - `INTERVAL_MINUTES`: Minutes between checks (default: 10)
//
// ### Cloudflare
// - `CF_API_TOKEN`: API token with Zone:DNS:Edit permission
// - `CF_ZONE_ID`: Zone identifier
// - `CF_RECORD_ID`: Identifier of the A record to update
// - `CF_RECORD_NAME`: Name of the A record (e.g. home.example.com)
//
// Missing Cloudflare settings do not stop the daemon; every update attempt
// logs a configuration error until they are provided.
//
// ### Optional
// - `DDNS_IP_SOURCE_URL`: Address echo endpoint (default: https://api.ipify.org)
// - `DDNS_HTTP_TIMEOUT_SECS`: Timeout for each outbound request (default: 30)
// - `DDNS_MODE`: Set to `dry-run` to log updates instead of sending them
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info; an
//   unknown name logs a warning and uses info)
//
// ## Example
//
// ```bash
// export INTERVAL_MINUTES=5
// export CF_API_TOKEN=your_token
// export CF_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export CF_RECORD_ID=372e67954025e0ba6aaa6d586b9e0b59
// export CF_RECORD_NAME=home.example.com
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::{DEFAULT_ENV_FILE, load_env_file};
use ddns_core::{DdnsConfig, DdnsEngine};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// Configuration problems never stop the daemon; only plumbing failures
/// before the engine starts map to a non-zero code:
/// - 0: Clean shutdown
/// - 1: Startup error (logging or HTTP client setup)
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Logging or HTTP client setup failed
    StartupError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load the env file before anything reads the environment
    let env_file = env::var_os("DDNS_ENV_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
    let env_file_result = load_env_file(&env_file);

    let (log_level, log_level_error) =
        resolve_log_level(env::var("DDNS_LOG_LEVEL").ok().as_deref());

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::StartupError.into();
    }

    if let Some(e) = log_level_error {
        warn!("{}, using info", e);
    }

    // A broken env file is reported but not fatal
    match env_file_result {
        Ok(true) => info!("Loaded environment from {}", env_file.display()),
        Ok(false) => {}
        Err(e) => error!("{}", e),
    }

    info!("Starting ddnsd daemon");

    // Read after logging is up so fallback warnings are visible
    let config = DdnsConfig::from_env();
    info!("Configuration loaded: {:?}", config.provider);

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::StartupError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match engine.run().await {
            Ok(state) => {
                info!(
                    "Daemon stopped (last known IP: {})",
                    state
                        .last_known_ip()
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "none".to_string())
                );
                DdnsExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Daemon error: {}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Build the IP source, the provider and the engine from configuration
fn build_engine(config: &DdnsConfig) -> Result<DdnsEngine> {
    let ip_source = HttpIpSource::from_config(&config.ip_source, config.http_timeout)
        .context("failed to create HTTP IP source")?;
    info!("IP source: {}", ip_source.url());

    let provider =
        CloudflareProvider::from_config(config).context("failed to create Cloudflare provider")?;

    // Nothing consumes engine events here; the log stream is the only output
    let (engine, _event_rx) =
        DdnsEngine::new(Box::new(ip_source), Box::new(provider), &config.engine);

    Ok(engine)
}

/// Resolve `DDNS_LOG_LEVEL`, falling back to info for an unknown name
///
/// The error is handed back so it can be logged once the subscriber exists.
fn resolve_log_level(raw: Option<&str>) -> (Level, Option<anyhow::Error>) {
    match raw.map(parse_log_level) {
        None => (Level::INFO, None),
        Some(Ok(level)) => (level, None),
        Some(Err(e)) => (Level::INFO, Some(e)),
    }
}

/// Map a log level name onto a tracing level
fn parse_log_level(name: &str) -> Result<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            name
        ),
    }
}
