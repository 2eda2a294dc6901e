//! `DraftkitServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket frames → protocol messages → sync
//! hub → draft engine.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use draftkit_engine::{CatalogCache, DraftSession, UnitCatalog};
use draftkit_protocol::JsonCodec;
use draftkit_store::{MemoryStore, SessionStore};
use draftkit_sync::{DraftHub, HubConfig};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::handler::handle_connection;
use crate::{DraftkitError, DraftLogic};

/// The hub type the server runs.
pub type ServerHub<St> = DraftHub<DraftLogic, St>;

/// Shared state handed to every connection task.
pub(crate) struct ServerState<St> {
    pub(crate) hub: Arc<ServerHub<St>>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Draftkit server.
///
/// # Example
///
/// ```rust,no_run
/// use draftkit::prelude::*;
///
/// # async fn demo() -> Result<(), DraftkitError> {
/// let server = DraftkitServer::builder()
///     .bind("0.0.0.0:8080")
///     .build_in_memory()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct DraftkitServerBuilder {
    bind_addr: String,
    hub_config: HubConfig,
    catalog: Arc<CatalogCache>,
    idle_timeout: Duration,
}

impl DraftkitServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            hub_config: HubConfig::default(),
            catalog: Arc::new(CatalogCache::new(UnitCatalog::default())),
            idle_timeout: Duration::from_secs(45),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// Shares a catalog cache with the server. Keep a clone of the `Arc`
    /// to refresh it later.
    pub fn catalog(mut self, catalog: Arc<CatalogCache>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Connections silent for this long are dropped. Clients keep theirs
    /// open with heartbeats.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout.max(Duration::from_secs(1));
        self
    }

    /// Binds the listener and builds the server over `store`.
    pub async fn build<St>(self, store: St) -> Result<DraftkitServer<St>, DraftkitError>
    where
        St: SessionStore<DraftSession>,
    {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        info!(addr = %self.bind_addr, "WebSocket listener bound");

        let logic = Arc::new(DraftLogic::new(self.catalog));
        let hub = Arc::new(DraftHub::new(logic, Arc::new(store), self.hub_config));
        let state = Arc::new(ServerState {
            hub,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });
        Ok(DraftkitServer { listener, state })
    }

    /// Builds the server over a fresh [`MemoryStore`].
    pub async fn build_in_memory(
        self,
    ) -> Result<DraftkitServer<MemoryStore<DraftSession>>, DraftkitError> {
        self.build(MemoryStore::new()).await
    }
}

impl Default for DraftkitServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Draftkit server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DraftkitServer<St> {
    listener: TcpListener,
    state: Arc<ServerState<St>>,
}

impl DraftkitServer<MemoryStore<DraftSession>> {
    pub fn builder() -> DraftkitServerBuilder {
        DraftkitServerBuilder::new()
    }
}

impl<St> DraftkitServer<St>
where
    St: SessionStore<DraftSession>,
{
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The hub behind the server, for in-process owners and tests.
    pub fn hub(&self) -> Arc<ServerHub<St>> {
        Arc::clone(&self.state.hub)
    }

    /// Runs the accept loop and the retention sweeper until the process
    /// is terminated.
    pub async fn run(self) -> Result<(), DraftkitError> {
        // Detached: the sweeper exits on its own once the hub is dropped.
        Arc::clone(&self.state.hub).spawn_sweeper();
        info!("Draftkit server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, state).await {
                            debug!(%addr, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}
