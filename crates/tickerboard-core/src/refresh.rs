//! Single-flight board refresh.
//!
//! At most one build runs at a time. A refresh requested while a build is in
//! flight is dropped and reported as [`RefreshOutcome::Skipped`]. Readers only
//! ever see a complete board through [`BoardStore::snapshot`]; a new board
//! replaces the old one wholesale once its build has finished.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::debug;

use crate::board::{Board, BoardBuilder};
use crate::Holding;

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Rebuilt { generation: u64, board: Arc<Board> },
    Skipped,
}

impl RefreshOutcome {
    pub fn board(&self) -> Option<&Arc<Board>> {
        match self {
            Self::Rebuilt { board, .. } => Some(board),
            Self::Skipped => None,
        }
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

#[derive(Debug)]
pub struct BoardStore {
    builder: BoardBuilder,
    building: Mutex<()>,
    current: RwLock<Option<Arc<Board>>>,
    generation: AtomicU64,
}

impl BoardStore {
    pub fn new(builder: BoardBuilder) -> Self {
        Self {
            builder,
            building: Mutex::new(()),
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn builder(&self) -> &BoardBuilder {
        &self.builder
    }

    /// Latest completed board, if any build has finished yet.
    pub fn snapshot(&self) -> Option<Arc<Board>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed builds.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_building(&self) -> bool {
        self.building.try_lock().is_err()
    }

    /// Rebuilds the whole board from `holdings`, unless a build is running.
    pub async fn refresh(&self, holdings: &[Holding]) -> RefreshOutcome {
        let Ok(_building) = self.building.try_lock() else {
            debug!("refresh requested during an active build, skipping");
            return RefreshOutcome::Skipped;
        };

        let board = Arc::new(self.builder.build(holdings).await);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&board));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        debug!(generation, cells = board.len(), "board snapshot replaced");
        RefreshOutcome::Rebuilt { generation, board }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;
    use crate::FixtureProvider;

    fn store() -> BoardStore {
        let columns = NonZeroUsize::new(4).expect("non-zero");
        BoardStore::new(BoardBuilder::new(Arc::new(FixtureProvider::seeded()), columns))
    }

    #[tokio::test]
    async fn snapshot_is_empty_until_first_build() {
        let store = store();
        assert!(store.snapshot().is_none());
        assert_eq!(store.generation(), 0);

        let outcome = store.refresh(&[Holding::new("AAPL")]).await;

        assert!(!outcome.is_skipped());
        assert_eq!(store.generation(), 1);
        let snapshot = store.snapshot().expect("built");
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_the_board_wholesale() {
        let store = store();
        store.refresh(&[Holding::new("AAPL"), Holding::new("MSFT")]).await;
        let first = store.snapshot().expect("built");

        store.refresh(&[Holding::new("NVDA")]).await;
        let second = store.snapshot().expect("rebuilt");

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second.cells()[0].symbol().as_str(), "NVDA");
        assert_eq!(store.generation(), 2);
    }

    #[tokio::test]
    async fn spawned_refresh_holds_the_build_slot() {
        let provider = FixtureProvider::seeded().with_delay("SLOW", Duration::from_millis(100));
        let columns = NonZeroUsize::new(2).expect("non-zero");
        let store = Arc::new(BoardStore::new(BoardBuilder::new(Arc::new(provider), columns)));
        let holdings = vec![Holding::new("SLOW")];

        let task = {
            let store = Arc::clone(&store);
            let holdings = holdings.clone();
            tokio::spawn(async move { store.refresh(&holdings).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.refresh(&holdings).await.is_skipped());
        assert!(!task.await.expect("refresh task").is_skipped());
        assert_eq!(store.generation(), 1);
    }
}
