//! groupsync - synchronize Entra ID group membership from source groups.
//!
//! Fetches a JSON configuration document, then reconciles each entry
//! against the directory: either deriving a device group from the
//! transitive user membership of a source group (full reconcile with
//! attribute filters), or copying membership between groups
//! (additive-only).

use clap::{Parser, ValueEnum};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod error;

use error::{exit_code_for, CliError, CliResult};
use groupsync_engine::{
    fetch_entries, run_copy_sync, run_device_sync, CopyEntry, DeviceSyncEntry, EntryStatus,
    RunSummary, SyncOptions,
};
use groupsync_graph::{AuthContext, ClientAuth, Credentials, GraphClient, TokenAudience};

/// Which entry variant the configuration document holds.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyncMode {
    /// Derive device-group membership from user-group membership.
    DeviceSync,
    /// Copy membership from source groups into a destination group.
    Copy,
}

/// Synchronize Entra ID group membership from source groups.
#[derive(Parser)]
#[command(name = "groupsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL of the JSON configuration document.
    #[arg(long, env = "GROUPSYNC_CONFIG_URL")]
    config_url: String,

    /// Entra tenant ID.
    #[arg(long, env = "GROUPSYNC_TENANT_ID")]
    tenant_id: String,

    /// Application (client) ID.
    #[arg(long, env = "GROUPSYNC_CLIENT_ID")]
    client_id: String,

    /// Client secret. Mutually exclusive with --certificate-thumbprint.
    #[arg(long, env = "GROUPSYNC_CLIENT_SECRET", conflicts_with = "certificate_thumbprint")]
    client_secret: Option<String>,

    /// Certificate thumbprint for certificate-based authentication.
    #[arg(long, env = "GROUPSYNC_CERT_THUMBPRINT")]
    certificate_thumbprint: Option<String>,

    /// Which entry variant the configuration document holds.
    #[arg(long, value_enum, default_value = "device-sync")]
    mode: SyncMode,

    /// Compute and log reconciliation plans without applying them.
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let started = Instant::now();
    match run(cli).await {
        Ok(summary) => {
            print_summary(&summary, started.elapsed().as_secs_f64());
            match summary.failure_class() {
                None => std::process::exit(0),
                Some(class) => std::process::exit(exit_code_for(class)),
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("groupsync: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> CliResult<RunSummary> {
    let auth = match (cli.client_secret, cli.certificate_thumbprint) {
        (Some(secret), _) => ClientAuth::Secret(SecretString::from(secret)),
        (None, Some(thumbprint)) => ClientAuth::CertificateThumbprint(thumbprint),
        (None, None) => {
            return Err(CliError::Auth(
                "either --client-secret or --certificate-thumbprint is required".to_string(),
            ));
        }
    };

    let credentials = Credentials {
        tenant_id: cli.tenant_id,
        client_id: cli.client_id,
        auth,
    };

    let auth_context = Arc::new(AuthContext::new(credentials, TokenAudience::Graph));
    let graph = GraphClient::new(auth_context)
        .map_err(|e| CliError::Unclassified(e.to_string()))?;

    let http_client = reqwest::Client::new();
    let options = SyncOptions {
        dry_run: cli.dry_run,
    };

    let summary = match cli.mode {
        SyncMode::DeviceSync => {
            let entries: Vec<DeviceSyncEntry> =
                fetch_entries(&http_client, &cli.config_url).await?;
            run_device_sync(&graph, &entries, options).await?
        }
        SyncMode::Copy => {
            let entries: Vec<CopyEntry> = fetch_entries(&http_client, &cli.config_url).await?;
            run_copy_sync(&graph, &entries, options).await?
        }
    };

    Ok(summary)
}

fn print_summary(summary: &RunSummary, elapsed_secs: f64) {
    for outcome in &summary.outcomes {
        match &outcome.status {
            EntryStatus::Synced => println!(
                "  {}: {} added, {} removed ({:.1}s)",
                outcome.label,
                outcome.added,
                outcome.removed,
                outcome.elapsed.as_secs_f64()
            ),
            EntryStatus::Skipped(reason) => {
                println!("  {}: skipped ({reason})", outcome.label);
            }
            EntryStatus::Failed(e) => println!("  {}: FAILED ({e})", outcome.label),
        }
    }

    println!(
        "{} entries processed: {} added, {} removed, {} skipped, {} failed in {elapsed_secs:.1}s",
        summary.outcomes.len(),
        summary.total_added(),
        summary.total_removed(),
        summary.skipped(),
        summary.failed()
    );
}
