//! Persisted sync state and the storage seam behind it.
//!
//! The sync loop never touches storage directly. It receives a
//! [`SyncState`], returns the advanced one, and the caller persists it
//! through a [`StateStore`]. Postgres backs the store in production;
//! [`MemoryStateStore`] backs tests and dry runs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

/// Storage key for the row watermark.
pub const LAST_PROCESSED_ROW_KEY: &str = "lastProcessedRow";

/// Lease name guarding a sync pass.
pub const SYNC_LEASE_NAME: &str = "sync-pass";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state backend error: {0}")]
    Backend(String),

    #[error("stored value for {key} is out of range: {value}")]
    OutOfRange { key: String, value: i64 },
}

/// The incremental-sync bookkeeping carried between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    /// Sheet row number (1-based, header is row 1) of the last row that has
    /// been attempted.
    pub last_processed_row: u32,
}

impl SyncState {
    #[must_use]
    pub fn new(last_processed_row: u32) -> Self {
        Self { last_processed_row }
    }
}

/// Key-value persistence plus a single expiring lease.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads an integer value, `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<i64>, StateError>;

    /// Writes an integer value, replacing any previous one.
    async fn set(&self, key: &str, value: i64) -> Result<(), StateError>;

    /// Takes the named lease for `holder` if it is free or expired.
    ///
    /// Returns `false` when another holder owns an unexpired lease.
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, StateError>;

    /// Extends the lease by `ttl` from now if `holder` still owns it.
    ///
    /// Returns `false` when the lease is gone or belongs to another holder.
    async fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, StateError>;

    /// Releases the lease if `holder` still owns it. Releasing a lease held
    /// by someone else is a no-op.
    async fn release_lease(&self, name: &str, holder: &str) -> Result<(), StateError>;
}

/// Loads the watermark, `None` when tracking has never been initialized.
///
/// # Errors
///
/// Returns [`StateError`] if the backend fails or the stored value does not
/// fit a row number.
pub async fn load_sync_state(store: &dyn StateStore) -> Result<Option<SyncState>, StateError> {
    let Some(raw) = store.get(LAST_PROCESSED_ROW_KEY).await? else {
        return Ok(None);
    };
    let row = u32::try_from(raw).map_err(|_| StateError::OutOfRange {
        key: LAST_PROCESSED_ROW_KEY.to_string(),
        value: raw,
    })?;
    Ok(Some(SyncState::new(row)))
}

/// Persists the watermark.
///
/// # Errors
///
/// Returns [`StateError`] if the backend write fails.
pub async fn save_sync_state(store: &dyn StateStore, state: SyncState) -> Result<(), StateError> {
    store
        .set(LAST_PROCESSED_ROW_KEY, i64::from(state.last_processed_row))
        .await
}

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at: DateTime<Utc>,
}

/// Process-local [`StateStore`]; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, i64>>,
    leases: Mutex<HashMap<String, Lease>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a store pre-seeded with a watermark.
    #[must_use]
    pub fn with_watermark(row: u32) -> Self {
        let mut values = HashMap::new();
        values.insert(LAST_PROCESSED_ROW_KEY.to_string(), i64::from(row));
        Self {
            values: Mutex::new(values),
            leases: Mutex::default(),
        }
    }

    /// Current lease holder for `name`, ignoring expiry.
    pub async fn lease_holder(&self, name: &str) -> Option<String> {
        self.leases
            .lock()
            .await
            .get(name)
            .map(|lease| lease.holder.clone())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StateError> {
        Ok(self.values.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StateError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StateError::Backend(format!("invalid lease ttl: {e}")))?;

        let mut leases = self.leases.lock().await;
        if let Some(existing) = leases.get(name) {
            if existing.holder != holder && existing.expires_at > now {
                return Ok(false);
            }
        }
        leases.insert(
            name.to_string(),
            Lease {
                holder: holder.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StateError::Backend(format!("invalid lease ttl: {e}")))?;

        let mut leases = self.leases.lock().await;
        match leases.get_mut(name) {
            Some(lease) if lease.holder == holder => {
                lease.expires_at = Utc::now() + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<(), StateError> {
        let mut leases = self.leases.lock().await;
        if leases.get(name).is_some_and(|lease| lease.holder == holder) {
            leases.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unset_watermark_loads_as_none() {
        let store = MemoryStateStore::new();
        let state = load_sync_state(&store).await.expect("memory store never fails");
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn watermark_roundtrips_through_store() {
        let store = MemoryStateStore::new();
        save_sync_state(&store, SyncState::new(42)).await.unwrap();
        let state = load_sync_state(&store).await.unwrap();
        assert_eq!(state, Some(SyncState::new(42)));
    }

    #[tokio::test]
    async fn negative_stored_watermark_is_rejected() {
        let store = MemoryStateStore::new();
        store.set(LAST_PROCESSED_ROW_KEY, -1).await.unwrap();
        let err = load_sync_state(&store).await.unwrap_err();
        assert!(
            matches!(err, StateError::OutOfRange { value: -1, .. }),
            "expected OutOfRange, got: {err:?}"
        );
    }

    #[tokio::test]
    async fn second_holder_cannot_take_live_lease() {
        let store = MemoryStateStore::new();
        let ttl = Duration::from_secs(60);
        assert!(store.try_acquire_lease("pass", "a", ttl).await.unwrap());
        assert!(!store.try_acquire_lease("pass", "b", ttl).await.unwrap());
        assert_eq!(store.lease_holder("pass").await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn expired_lease_can_be_taken_over() {
        let store = MemoryStateStore::new();
        assert!(store
            .try_acquire_lease("pass", "a", Duration::ZERO)
            .await
            .unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store
            .try_acquire_lease("pass", "b", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.lease_holder("pass").await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn renewal_keeps_lease_from_expiring() {
        let store = MemoryStateStore::new();
        let short = Duration::from_millis(20);
        assert!(store.try_acquire_lease("pass", "a", short).await.unwrap());
        assert!(store
            .renew_lease("pass", "a", Duration::from_secs(60))
            .await
            .unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!store
            .try_acquire_lease("pass", "b", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.lease_holder("pass").await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn renewal_fails_after_takeover() {
        let store = MemoryStateStore::new();
        store
            .try_acquire_lease("pass", "a", Duration::ZERO)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .try_acquire_lease("pass", "b", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(!store
            .renew_lease("pass", "a", Duration::from_secs(60))
            .await
            .unwrap());
        assert!(store
            .renew_lease("pass", "b", Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn renewal_without_lease_fails() {
        let store = MemoryStateStore::new();
        assert!(!store
            .renew_lease("pass", "a", Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn release_by_non_holder_is_ignored() {
        let store = MemoryStateStore::new();
        let ttl = Duration::from_secs(60);
        store.try_acquire_lease("pass", "a", ttl).await.unwrap();
        store.release_lease("pass", "b").await.unwrap();
        assert_eq!(store.lease_holder("pass").await.as_deref(), Some("a"));

        store.release_lease("pass", "a").await.unwrap();
        assert!(store.lease_holder("pass").await.is_none());
    }
}
