//! Shared live server state.

use arc_swap::ArcSwap;
use shared::QueryState;
use std::sync::Arc;

/// Lock-free cell holding the current [`QueryState`].
///
/// The game side publishes whole snapshots with [`store`](Self::store); the
/// responder loads the latest one per answered query. Loads never block and
/// never suspend, so the responder stays safe to call from any number of
/// datagram workers.
pub struct SharedQueryState {
    inner: ArcSwap<QueryState>,
}

impl SharedQueryState {
    pub fn new(initial: QueryState) -> Self {
        Self {
            inner: ArcSwap::from_pointee(initial),
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<QueryState> {
        self.inner.load_full()
    }

    /// Publishes a new snapshot, replacing the previous one.
    pub fn store(&self, state: QueryState) {
        self.inner.store(Arc::new(state));
    }
}
