// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GatewayCtl — control plane for an Envoy-based API gateway
//
//  Wires: durable store → writer task → translator → snapshot cache
//  → xDS ADS server, plus the admin HTTP façade, under one process.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use gatewayctl_admin::server::AdminServer;
use gatewayctl_core::GatewayCtlConfig;
use gatewayctl_observability::{logging, MetricsCollector};
use gatewayctl_store::{SqliteStore, Store};
use gatewayctl_xds::{AdsServer, AggregatedDiscoveryServiceServer, SnapshotCache};
use tracing::{error, info};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(name = "gatewayctl", version, about = "GatewayCtl control plane")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = GatewayCtlConfig::load(cli.config.as_deref())?;

    logging::init(&config.log_level, &config.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "gatewayctl starting");

    let store = Arc::new(SqliteStore::connect(&config.store_path, config.snapshot_version_initial).await?);
    store.load_all().await?;
    info!(records = store.list().await.len(), "store rehydrated");

    let snapshots = Arc::new(SnapshotCache::new());
    let metrics = Arc::new(MetricsCollector::new()?);
    let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots.clone());

    // Seed an initial snapshot from whatever the store rehydrated, so the
    // first xDS stream doesn't have to wait for the first mutation.
    if let Ok(bundle) = gatewayctl_translator::translate(&store.list().await) {
        if let Ok(version) = store.snapshot_version().await {
            snapshots.set_snapshot(
                gatewayctl_xds::snapshot::GLOBAL_NODE,
                gatewayctl_xds::Snapshot { version: version.max(1), resources: bundle },
            );
        }
    }

    let admin_server = AdminServer::new(config.admin_addr, store.clone(), writer, metrics.clone());
    let admin_handle = tokio::spawn(async move {
        if let Err(err) = admin_server.serve().await {
            error!(error = %err, "admin server failed");
        }
    });

    let ads = AdsServer::new(snapshots.clone(), metrics.clone());
    let listen_addr = config.listen_addr;
    let xds_handle = tokio::spawn(async move {
        let result = tonic::transport::Server::builder()
            .add_service(AggregatedDiscoveryServiceServer::new(ads))
            .serve(listen_addr)
            .await;
        if let Err(err) = result {
            error!(error = %err, "xds server failed");
        }
    });

    info!(admin_addr = %config.admin_addr, listen_addr = %config.listen_addr, "gatewayctl ready");

    setup_signal_handler();
    while !SHUTDOWN.load(Ordering::Relaxed) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    info!("shutdown signal received, stopping");
    admin_handle.abort();
    xds_handle.abort();

    info!("gatewayctl stopped");
    Ok(())
}

fn setup_signal_handler() {
    for sig in [libc::SIGTERM, libc::SIGINT] {
        unsafe {
            libc::signal(sig, signal_handler as libc::sighandler_t);
        }
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}
