// # ionos-dnsd - one-shot IONOS DNS reconciliation driver
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add DNS logic, comparison logic or retry logic here
// - All convergence logic MUST be in ionos-dns-core
// - Configuration is via environment variables ONLY
//
// The driver is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading one declared record resource from a JSON file
// 3. Running the engine exactly once (apply or delete)
// 4. Folding the outcome into the resource status and printing both
// 5. Mapping the outcome to an exit code the scheduler can act on
//
// Scheduling and retries belong to whatever runs this binary (cron, a
// systemd timer, a CI job). A non-zero exit means "run me again later".
//
// ## Configuration
//
// ### Provider
// - `IONOS_API_KEY`: API key ("<prefix>.<secret>"), required
// - `IONOS_API_BASE_URL`: API root (default: https://api.hosting.ionos.com/dns/v1)
// - `IONOS_HTTP_TIMEOUT_SECS`: Per-request timeout (default: 30)
//
// ### Run
// - `DNSYNC_RECORD_FILE`: Path to the record resource JSON, required
// - `DNSYNC_ACTION`: `apply` or `delete` (default: apply)
// - `DNSYNC_MODE`: `live` or `dry-run` (default: live)
// - `DNSYNC_WRITE_STATUS`: Write the updated status back to the record file (default: false)
// - `DNSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// cat > www.json <<'EOF'
// {
//   "name": "www",
//   "spec": {
//     "rootName": "example.com",
//     "name": "www.example.com",
//     "type": "CNAME",
//     "content": "target.example.net"
//   }
// }
// EOF
//
// export IONOS_API_KEY=prefix.secret
// export DNSYNC_RECORD_FILE=www.json
// export DNSYNC_MODE=dry-run
//
// ionos-dnsd
// ```

use anyhow::{Context, Result};
use chrono::Utc;
use ionos_dns_core::{
    ClientConfig, DnsRecordResource, SyncAction, SyncConfig, SyncEngine, SyncResult,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Record converged for the requested action
/// - 1: Configuration or startup error
/// - 2: Runtime error (transport failure, unclassifiable response, interrupted)
/// - 3: Pass completed but the record did not converge (Unauthorized, NotFound, Conflict)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsyncExitCode {
    Converged = 0,
    ConfigError = 1,
    RuntimeError = 2,
    Unconverged = 3,
}

impl From<DnsyncExitCode> for ExitCode {
    fn from(code: DnsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&SyncResult> for DnsyncExitCode {
    fn from(result: &SyncResult) -> Self {
        if result.is_converged() {
            DnsyncExitCode::Converged
        } else {
            DnsyncExitCode::Unconverged
        }
    }
}

/// Application configuration
struct Config {
    api_key: String,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    record_file: PathBuf,
    action: String,
    mode: String,
    write_status: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any variable lookup
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_secs = match var("IONOS_HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(raw.parse::<u64>().with_context(|| {
                format!("IONOS_HTTP_TIMEOUT_SECS must be a number of seconds. Got: {}", raw)
            })?),
            None => None,
        };

        Ok(Self {
            api_key: var("IONOS_API_KEY").context(
                "IONOS_API_KEY is required. Set it via: export IONOS_API_KEY=prefix.secret",
            )?,
            base_url: var("IONOS_API_BASE_URL").filter(|s| !s.is_empty()),
            timeout_secs,
            record_file: var("DNSYNC_RECORD_FILE")
                .map(PathBuf::from)
                .context("DNSYNC_RECORD_FILE is required")?,
            action: var("DNSYNC_ACTION").unwrap_or_else(|| "apply".to_string()),
            mode: var("DNSYNC_MODE").unwrap_or_else(|| "live".to_string()),
            write_status: var("DNSYNC_WRITE_STATUS")
                .is_some_and(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes")),
            log_level: var("DNSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.sync_config()?.validate()?;
        self.sync_action()?;

        if !self.record_file.is_file() {
            anyhow::bail!(
                "DNSYNC_RECORD_FILE does not exist or is not a file: {}",
                self.record_file.display()
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Engine configuration: client settings plus the run mode
    fn sync_config(&self) -> Result<SyncConfig> {
        let mut client = ClientConfig::new(self.api_key.clone());
        if let Some(ref base_url) = self.base_url {
            client = client.with_base_url(base_url.clone());
        }
        if let Some(timeout_secs) = self.timeout_secs {
            client = client.with_timeout_secs(timeout_secs);
        }

        let dry_run = match self.mode.to_lowercase().as_str() {
            "live" => false,
            "dry-run" => true,
            _ => anyhow::bail!(
                "DNSYNC_MODE '{}' is not supported. Supported modes: live, dry-run",
                self.mode
            ),
        };

        Ok(SyncConfig::new(client).with_dry_run(dry_run))
    }

    fn sync_action(&self) -> Result<SyncAction> {
        match self.action.to_lowercase().as_str() {
            "apply" => Ok(SyncAction::Apply),
            "delete" => Ok(SyncAction::Delete),
            _ => anyhow::bail!(
                "DNSYNC_ACTION '{}' is not supported. Supported actions: apply, delete",
                self.action
            ),
        }
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("record_file", &self.record_file)
            .field("action", &self.action)
            .field("mode", &self.mode)
            .field("write_status", &self.write_status)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Read a declared record resource from a JSON file
fn load_resource(path: &Path) -> Result<DnsRecordResource> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse record file {}", path.display()))
}

/// Write the resource, including its updated status, back to `path`
fn save_resource(path: &Path, resource: &DnsRecordResource) -> Result<()> {
    let json = serde_json::to_string_pretty(resource)?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write record file {}", path.display()))
}

/// What the driver prints: the decision of the pass and the resulting status
///
/// In dry-run mode the status is left as loaded, so the decision is the
/// only place the would-be outcome shows up.
fn report(result: &SyncResult, resource: &DnsRecordResource) -> serde_json::Value {
    serde_json::json!({
        "name": resource.name,
        "result": result,
        "status": resource.status,
    })
}

/// Run one engine pass and fold its outcome into the resource status
async fn reconcile_once(
    engine: &SyncEngine,
    resource: &mut DnsRecordResource,
    action: SyncAction,
    dry_run: bool,
) -> Result<SyncResult> {
    let result = match action {
        SyncAction::Apply => engine.ensure_created(resource, dry_run).await?,
        SyncAction::Delete => engine.ensure_deleted(resource, dry_run).await?,
    };

    // Dry-run reports what would happen; it must not claim the provider changed
    if !dry_run {
        let now = Utc::now();
        match action {
            SyncAction::Apply => resource.status.record_apply(result.outcome, now),
            SyncAction::Delete => resource.status.record_delete(result.outcome, now),
        }
    }

    Ok(result)
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    info!("Starting ionos-dnsd");

    let resource = match load_resource(&config.record_file) {
        Ok(resource) => resource,
        Err(e) => {
            error!("{:#}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(&config, resource).await {
            Ok(code) => code,
            Err(e) => {
                error!("Reconciliation error: {:#}", e);
                DnsyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one pass, print the resulting status and choose the exit code
async fn run(config: &Config, mut resource: DnsRecordResource) -> Result<DnsyncExitCode> {
    let action = config.sync_action()?;
    let sync = config.sync_config()?;
    let dry_run = sync.dry_run;

    if dry_run {
        warn!("Running in DRY-RUN mode - no changes will be made");
    }

    let client = ionos_dns_http::connect(&sync.client)?;
    let engine = SyncEngine::new(Box::new(client));

    info!(
        "Reconciling {} ({:?}) via {}",
        resource.name,
        action,
        engine.provider_name()
    );

    let result = tokio::select! {
        result = reconcile_once(&engine, &mut resource, action, dry_run) => result?,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("Interrupted before the pass completed");
        }
    };

    info!("{} finished with {}", resource.name, result.outcome);
    println!("{}", serde_json::to_string_pretty(&report(&result, &resource))?);

    if config.write_status && !dry_run {
        save_resource(&config.record_file, &resource)?;
    }

    Ok(DnsyncExitCode::from(&result))
}
