//! Quota ledger: per-account byte accounting on top of a [`LedgerStore`].

use encore_core::models::{LedgerUpdate, QuotaAccount, QuotaMode};
use encore_core::{IngestError, IngestResult};
use encore_db::LedgerStore;
use std::sync::Arc;
use uuid::Uuid;

/// Quota gate and counter for uploads and deletions.
///
/// In [`QuotaMode::Check`] the gate only reads and compares; usage is added
/// after the upload is persisted. In [`QuotaMode::Reserve`] the gate is a
/// single conditional update, so concurrent uploads cannot overshoot the limit.
#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn LedgerStore>,
    mode: QuotaMode,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn LedgerStore>, mode: QuotaMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> QuotaMode {
        self.mode
    }

    pub async fn account(&self, account_id: Uuid) -> IngestResult<QuotaAccount> {
        self.store
            .get_account(account_id)
            .await?
            .ok_or_else(|| not_found(account_id))
    }

    pub async fn open_account(&self, account_id: Uuid, limit_bytes: i64) -> IngestResult<QuotaAccount> {
        if limit_bytes < 0 {
            return Err(IngestError::Validation(
                "Quota limit must be non-negative".to_string(),
            ));
        }
        self.store.open_account(account_id, limit_bytes).await
    }

    /// Fails with [`IngestError::QuotaExceeded`] when `used + delta > limit`.
    pub async fn check_and_reserve(
        &self,
        account_id: Uuid,
        delta_bytes: i64,
    ) -> IngestResult<QuotaAccount> {
        match self.mode {
            QuotaMode::Check => {
                let account = self.account(account_id).await?;
                account.check(delta_bytes)?;
                Ok(account)
            }
            QuotaMode::Reserve => {
                let reserved = self
                    .store
                    .apply_update(account_id, LedgerUpdate::ReserveWithinLimit(delta_bytes))
                    .await?;
                match reserved {
                    Some(account) => Ok(account),
                    None => {
                        // No row matched: either missing or over the limit.
                        let account = self.account(account_id).await?;
                        Err(IngestError::quota_exceeded(
                            account.used_bytes,
                            account.limit_bytes,
                            delta_bytes,
                        ))
                    }
                }
            }
        }
    }

    pub async fn increment(&self, account_id: Uuid, delta_bytes: i64) -> IngestResult<QuotaAccount> {
        self.apply(account_id, LedgerUpdate::Increment(delta_bytes))
            .await
    }

    /// Floors at zero.
    pub async fn decrement(&self, account_id: Uuid, delta_bytes: i64) -> IngestResult<QuotaAccount> {
        self.apply(account_id, LedgerUpdate::Decrement(delta_bytes))
            .await
    }

    /// Count a persisted upload. In reserve mode the bytes were already counted
    /// by [`Self::check_and_reserve`], so this returns `Ok(None)`.
    pub async fn commit(
        &self,
        account_id: Uuid,
        delta_bytes: i64,
    ) -> IngestResult<Option<QuotaAccount>> {
        match self.mode {
            QuotaMode::Check => self.increment(account_id, delta_bytes).await.map(Some),
            QuotaMode::Reserve => Ok(None),
        }
    }

    /// Undo a [`Self::check_and_reserve`] whose upload did not complete.
    pub async fn release(
        &self,
        account_id: Uuid,
        delta_bytes: i64,
    ) -> IngestResult<Option<QuotaAccount>> {
        match self.mode {
            QuotaMode::Check => Ok(None),
            QuotaMode::Reserve => self.decrement(account_id, delta_bytes).await.map(Some),
        }
    }

    async fn apply(&self, account_id: Uuid, update: LedgerUpdate) -> IngestResult<QuotaAccount> {
        self.store
            .apply_update(account_id, update)
            .await?
            .ok_or_else(|| not_found(account_id))
    }
}

fn not_found(account_id: Uuid) -> IngestError {
    IngestError::NotFound(format!("Quota account {} not found", account_id))
}
