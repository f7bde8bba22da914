//! Postgres-backed [`StateStore`]: `sync_state` key-value rows plus the
//! `sync_leases` table.

use std::time::Duration;

use async_trait::async_trait;
use sheetsync_core::{StateError, StateStore};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend(err: sqlx::Error) -> StateError {
    StateError::Backend(err.to_string())
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StateError> {
        sqlx::query_scalar::<_, i64>("SELECT value FROM sync_state WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), StateError> {
        sqlx::query(
            "INSERT INTO sync_state (key, value) \
             VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET \
                 value      = EXCLUDED.value, \
                 updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    /// Single-statement compare-and-swap: the upsert only overwrites a lease
    /// that has expired or already belongs to `holder`.
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let acquired = sqlx::query_scalar::<_, String>(
            "INSERT INTO sync_leases (name, holder, acquired_at, expires_at) \
             VALUES ($1, $2, NOW(), NOW() + make_interval(secs => $3)) \
             ON CONFLICT (name) DO UPDATE SET \
                 holder      = EXCLUDED.holder, \
                 acquired_at = EXCLUDED.acquired_at, \
                 expires_at  = EXCLUDED.expires_at \
             WHERE sync_leases.expires_at <= NOW() \
                OR sync_leases.holder = EXCLUDED.holder \
             RETURNING holder",
        )
        .bind(name)
        .bind(holder)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(acquired.is_some())
    }

    async fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let result = sqlx::query(
            "UPDATE sync_leases \
             SET expires_at = NOW() + make_interval(secs => $3) \
             WHERE name = $1 AND holder = $2",
        )
        .bind(name)
        .bind(holder)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<(), StateError> {
        sqlx::query("DELETE FROM sync_leases WHERE name = $1 AND holder = $2")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
