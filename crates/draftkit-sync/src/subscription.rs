//! Spectator event streams.

use std::sync::Arc;

use draftkit_protocol::SyncEvent;
use tokio::sync::watch;

use crate::Revision;

enum Phase<S> {
    /// The snapshot has not been handed out yet.
    Start(watch::Receiver<Revision<S>>),
    /// Waiting for the next revision.
    Live(watch::Receiver<Revision<S>>),
    /// `not_found` is next, then the stream ends.
    Gone,
    Done,
}

/// A spectator's view of one session.
///
/// The first event is always a `snapshot` (or `not_found` when the key
/// does not exist). After that each call to [`next`](Self::next) waits for
/// a newer revision. A slow spectator skips straight to the latest one;
/// it never sees a revision go backwards. When the session is destroyed
/// or expires the stream ends with `not_found`.
pub struct Subscription<S> {
    phase: Phase<S>,
}

impl<S: Clone> Subscription<S> {
    pub(crate) fn live(receiver: watch::Receiver<Revision<S>>) -> Self {
        Self {
            phase: Phase::Start(receiver),
        }
    }

    pub(crate) fn not_found() -> Self {
        Self { phase: Phase::Gone }
    }

    /// The next event, or `None` after `not_found` has been delivered.
    pub async fn next(&mut self) -> Option<SyncEvent<S>> {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Start(mut rx) => {
                let current = rx.borrow_and_update().clone();
                self.phase = Phase::Live(rx);
                Some(SyncEvent::Snapshot {
                    revision: current.revision,
                    session: unwrap_state(current.state),
                })
            }
            Phase::Live(mut rx) => match rx.changed().await {
                Ok(()) => {
                    let current = rx.borrow_and_update().clone();
                    self.phase = Phase::Live(rx);
                    Some(SyncEvent::Update {
                        revision: current.revision,
                        session: unwrap_state(current.state),
                    })
                }
                Err(_) => Some(SyncEvent::NotFound),
            },
            Phase::Gone => Some(SyncEvent::NotFound),
            Phase::Done => None,
        }
    }

    /// Whether the stream has ended.
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }
}

/// Takes the state out of the `Arc` when this was the last reference,
/// clones it otherwise.
fn unwrap_state<S: Clone>(state: Arc<S>) -> S {
    Arc::try_unwrap(state).unwrap_or_else(|shared| (*shared).clone())
}
