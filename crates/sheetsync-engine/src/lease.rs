use std::time::Duration;

use sheetsync_core::{StateStore, SYNC_LEASE_NAME};
use uuid::Uuid;

use crate::error::PassError;

/// Exclusive right to move the watermark, held for the length of one pass.
///
/// The lease is taken with a fixed expiry; a pass renews it before every
/// remote call and stops as soon as a renewal fails.
pub struct PassLease<'a> {
    store: &'a dyn StateStore,
    holder: String,
    ttl: Duration,
}

impl<'a> PassLease<'a> {
    /// Takes the pass lease under a fresh holder id.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::LeaseHeld`] when another holder owns a live lease
    /// and [`PassError::State`] when the store fails.
    pub async fn acquire(store: &'a dyn StateStore, ttl: Duration) -> Result<Self, PassError> {
        let holder = format!("sheetsync-{}", Uuid::new_v4());
        if !store.try_acquire_lease(SYNC_LEASE_NAME, &holder, ttl).await? {
            tracing::warn!(lease = SYNC_LEASE_NAME, "sync lease held elsewhere, skipping");
            return Err(PassError::LeaseHeld);
        }
        tracing::debug!(lease = SYNC_LEASE_NAME, %holder, "sync lease acquired");
        Ok(Self { store, holder, ttl })
    }

    #[must_use]
    pub fn store(&self) -> &'a dyn StateStore {
        self.store
    }

    #[must_use]
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Pushes the expiry out by another `ttl`. Returns `false` once the lease
    /// belongs to someone else or the store cannot confirm it.
    pub async fn renew(&self) -> bool {
        match self
            .store
            .renew_lease(SYNC_LEASE_NAME, &self.holder, self.ttl)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(
                    lease = SYNC_LEASE_NAME,
                    holder = %self.holder,
                    "sync lease lost to another holder"
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    lease = SYNC_LEASE_NAME,
                    holder = %self.holder,
                    error = %e,
                    "failed to renew sync lease"
                );
                false
            }
        }
    }

    /// Releases the lease. Failures are logged; the lease expires on its own.
    pub async fn release(self) {
        if let Err(e) = self.store.release_lease(SYNC_LEASE_NAME, &self.holder).await {
            tracing::warn!(
                lease = SYNC_LEASE_NAME,
                holder = %self.holder,
                error = %e,
                "failed to release sync lease"
            );
        }
    }
}
