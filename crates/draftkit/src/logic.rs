//! Draft rules plugged into the sync hub.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use draftkit_engine::{CatalogCache, DraftCommand, DraftError, DraftSession, SessionConfig};
use draftkit_sync::SessionLogic;

/// [`SessionLogic`] for draft sessions.
///
/// Holds the shared catalog so commands are checked against whatever was
/// loaded last. A catalog refresh affects commands applied after it, never
/// the stored picks.
#[derive(Debug, Clone)]
pub struct DraftLogic {
    catalog: Arc<CatalogCache>,
}

impl DraftLogic {
    pub fn new(catalog: Arc<CatalogCache>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }
}

impl SessionLogic for DraftLogic {
    type Config = SessionConfig;
    type State = DraftSession;
    type Command = DraftCommand;
    type Error = DraftError;

    fn create(&self, config: SessionConfig, now: DateTime<Utc>) -> DraftSession {
        DraftSession::new(config, now)
    }

    fn apply(
        &self,
        state: &mut DraftSession,
        command: DraftCommand,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        let catalog = self.catalog.snapshot();
        state.execute(command, &catalog, now)
    }

    fn is_complete(&self, state: &DraftSession) -> bool {
        state.is_complete()
    }

    fn rejection_code(&self, error: &DraftError) -> &'static str {
        error.code()
    }
}
