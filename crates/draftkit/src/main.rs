//! The `draftkit` server binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use draftkit::{DraftkitError, DraftkitServer, DraftkitServerBuilder};
use draftkit_engine::{CatalogCache, DraftSession, UnitCatalog};
use draftkit_store::{FileStore, MemoryStore, SessionStore, StoreConfig};
use draftkit_sync::HubConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "draftkit", version, about = "Live draft sessions with WebSocket spectators")]
struct Arguments {
    /// Address to listen on.
    #[arg(long, env = "DRAFTKIT_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Seconds an idle session is kept before it expires.
    #[arg(long, env = "DRAFTKIT_RETENTION_SECS", default_value_t = 86_400)]
    retention_secs: u64,

    /// Seconds between retention sweeps.
    #[arg(long, env = "DRAFTKIT_SWEEP_SECS", default_value_t = 60)]
    sweep_secs: u64,

    /// Unit catalog as a JSON array. Without one, every unit prices as
    /// common. Reloaded on SIGHUP.
    #[arg(long, env = "DRAFTKIT_CATALOG")]
    catalog: Option<PathBuf>,

    /// Directory for session files. Sessions live in memory when unset.
    #[arg(long, env = "DRAFTKIT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), DraftkitError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = Arguments::parse();
    info!(
        bind = %args.bind,
        retention_secs = args.retention_secs,
        sweep_secs = args.sweep_secs,
        data_dir = ?args.data_dir,
        "configuration loaded"
    );

    let catalog = match &args.catalog {
        Some(path) => load_catalog(path).await?,
        None => {
            warn!("no unit catalog given, all units price as common");
            UnitCatalog::default()
        }
    };
    let catalog = Arc::new(CatalogCache::new(catalog));
    if let Some(path) = args.catalog.clone() {
        watch_reload_signal(path, Arc::clone(&catalog));
    }

    let hub_config = HubConfig {
        store: StoreConfig {
            retention: Duration::from_secs(args.retention_secs),
        },
        sweep_interval: Duration::from_secs(args.sweep_secs),
        ..HubConfig::default()
    };
    let builder = DraftkitServer::builder()
        .bind(&args.bind)
        .hub_config(hub_config)
        .catalog(catalog);

    match args.data_dir {
        Some(dir) => serve(builder, FileStore::open(dir).await?).await,
        None => serve(builder, MemoryStore::new()).await,
    }
}

async fn serve<St>(builder: DraftkitServerBuilder, store: St) -> Result<(), DraftkitError>
where
    St: SessionStore<DraftSession>,
{
    let server = builder.build(store).await?;
    info!(addr = %server.local_addr()?, "listening");
    server.run().await
}

async fn load_catalog(path: &Path) -> Result<UnitCatalog, DraftkitError> {
    let text = tokio::fs::read_to_string(path).await?;
    let catalog = UnitCatalog::from_json_str(&text)?;
    info!(
        path = %path.display(),
        units = catalog.len(),
        skipped = catalog.skipped(),
        "unit catalog loaded"
    );
    Ok(catalog)
}

/// Reloads the catalog file whenever the process receives SIGHUP.
#[cfg(unix)]
fn watch_reload_signal(path: PathBuf, cache: Arc<CatalogCache>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGHUP, catalog reload disabled");
            return;
        }
    };
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            match load_catalog(&path).await {
                Ok(catalog) => cache.refresh(catalog),
                Err(e) => warn!(error = %e, "catalog reload failed, keeping the old one"),
            }
        }
    });
}

#[cfg(not(unix))]
fn watch_reload_signal(_path: PathBuf, _cache: Arc<CatalogCache>) {}
