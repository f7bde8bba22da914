//! Watermark bookkeeping over a [`StateStore`].

use sheetsync_core::{load_sync_state, save_sync_state, StateError, StateStore, SyncState};

/// Reads and moves the persisted watermark.
///
/// `initialize` and `advance` are safe to call repeatedly; only `reset` can
/// move the watermark backwards.
pub struct SyncTracker<'a> {
    store: &'a dyn StateStore,
}

impl<'a> SyncTracker<'a> {
    #[must_use]
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self { store }
    }

    /// The persisted watermark, `None` before tracking was initialized.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the store cannot be read.
    pub async fn current(&self) -> Result<Option<SyncState>, StateError> {
        load_sync_state(self.store).await
    }

    /// Sets the watermark to `last_row` unless one is already stored, so rows
    /// present before tracking began are never synced.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the store cannot be read or written.
    pub async fn initialize(&self, last_row: u32) -> Result<SyncState, StateError> {
        if let Some(existing) = self.current().await? {
            tracing::debug!(
                watermark = existing.last_processed_row,
                "tracking already initialized"
            );
            return Ok(existing);
        }
        let state = SyncState::new(last_row);
        save_sync_state(self.store, state).await?;
        tracing::info!(watermark = last_row, "tracking initialized");
        Ok(state)
    }

    /// Sets the watermark to `last_row` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the store cannot be written.
    pub async fn reset(&self, last_row: u32) -> Result<SyncState, StateError> {
        let state = SyncState::new(last_row);
        save_sync_state(self.store, state).await?;
        tracing::info!(watermark = last_row, "tracking reset");
        Ok(state)
    }

    /// Moves the watermark forward to `row`. A lower `row` leaves the stored
    /// value in place.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the store cannot be read or written.
    pub async fn advance(&self, row: u32) -> Result<SyncState, StateError> {
        let current = self.current().await?.unwrap_or_default();
        let next = advance_state(current, row);
        if next != current {
            save_sync_state(self.store, next).await?;
            tracing::debug!(
                from = current.last_processed_row,
                to = next.last_processed_row,
                "watermark advanced"
            );
        }
        Ok(next)
    }
}

/// Monotonic advance: the result is never below `state`.
#[must_use]
pub fn advance_state(state: SyncState, row: u32) -> SyncState {
    SyncState::new(state.last_processed_row.max(row))
}

#[cfg(test)]
mod tests {
    use sheetsync_core::MemoryStateStore;

    use super::*;

    #[tokio::test]
    async fn initialize_sets_unset_watermark() {
        let store = MemoryStateStore::new();
        let tracker = SyncTracker::new(&store);
        assert_eq!(tracker.current().await.unwrap(), None);

        let state = tracker.initialize(12).await.unwrap();
        assert_eq!(state, SyncState::new(12));
        assert_eq!(tracker.current().await.unwrap(), Some(SyncState::new(12)));
    }

    #[tokio::test]
    async fn initialize_keeps_existing_watermark() {
        let store = MemoryStateStore::with_watermark(5);
        let tracker = SyncTracker::new(&store);
        let state = tracker.initialize(40).await.unwrap();
        assert_eq!(state, SyncState::new(5));
    }

    #[tokio::test]
    async fn reset_overwrites_in_either_direction() {
        let store = MemoryStateStore::with_watermark(30);
        let tracker = SyncTracker::new(&store);
        assert_eq!(tracker.reset(10).await.unwrap(), SyncState::new(10));
        assert_eq!(tracker.reset(50).await.unwrap(), SyncState::new(50));
        assert_eq!(tracker.current().await.unwrap(), Some(SyncState::new(50)));
    }

    #[tokio::test]
    async fn advance_never_moves_backwards() {
        let store = MemoryStateStore::with_watermark(20);
        let tracker = SyncTracker::new(&store);
        assert_eq!(tracker.advance(15).await.unwrap(), SyncState::new(20));
        assert_eq!(tracker.advance(25).await.unwrap(), SyncState::new(25));
        assert_eq!(tracker.current().await.unwrap(), Some(SyncState::new(25)));
    }

    #[test]
    fn advance_state_takes_the_max() {
        assert_eq!(advance_state(SyncState::new(3), 9), SyncState::new(9));
        assert_eq!(advance_state(SyncState::new(9), 3), SyncState::new(9));
    }
}
