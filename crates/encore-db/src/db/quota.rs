//! Quota ledger repository: per-account byte usage in the quota_accounts table.
//!
//! Every mutation is a single `UPDATE ... RETURNING` statement so concurrent callers
//! never interleave a read and a write.

use async_trait::async_trait;
use encore_core::models::{LedgerUpdate, QuotaAccount};
use encore_core::IngestResult;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistence for quota accounts.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current state, with a NULL usage read as zero.
    async fn get_account(&self, account_id: Uuid) -> IngestResult<Option<QuotaAccount>>;

    /// Apply `update` atomically and return the account afterwards.
    ///
    /// `None` means no row matched: the account does not exist, or a
    /// [`LedgerUpdate::ReserveWithinLimit`] did not fit.
    async fn apply_update(
        &self,
        account_id: Uuid,
        update: LedgerUpdate,
    ) -> IngestResult<Option<QuotaAccount>>;

    /// Create the account if missing; an existing account is left untouched.
    async fn open_account(&self, account_id: Uuid, limit_bytes: i64) -> IngestResult<QuotaAccount>;
}

/// Row type for quota_accounts table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct QuotaAccountRow {
    pub account_id: Uuid,
    pub used_bytes: i64,
    pub limit_bytes: i64,
}

impl From<QuotaAccountRow> for QuotaAccount {
    fn from(row: QuotaAccountRow) -> Self {
        QuotaAccount {
            account_id: row.account_id,
            used_bytes: row.used_bytes,
            limit_bytes: row.limit_bytes,
        }
    }
}

/// SQL for one ledger mutation. `$1` is the account id, `$2` the delta.
fn update_statement(update: &LedgerUpdate) -> &'static str {
    match update {
        LedgerUpdate::Increment(_) => {
            r#"
            UPDATE quota_accounts
            SET used_bytes = COALESCE(used_bytes, 0) + $2, updated_at = NOW()
            WHERE account_id = $1
            RETURNING account_id, used_bytes, limit_bytes
            "#
        }
        LedgerUpdate::Decrement(_) => {
            r#"
            UPDATE quota_accounts
            SET used_bytes = GREATEST(0, COALESCE(used_bytes, 0) - $2), updated_at = NOW()
            WHERE account_id = $1
            RETURNING account_id, used_bytes, limit_bytes
            "#
        }
        LedgerUpdate::ReserveWithinLimit(_) => {
            r#"
            UPDATE quota_accounts
            SET used_bytes = COALESCE(used_bytes, 0) + $2, updated_at = NOW()
            WHERE account_id = $1 AND COALESCE(used_bytes, 0) + $2 <= limit_bytes
            RETURNING account_id, used_bytes, limit_bytes
            "#
        }
    }
}

/// Repository for quota_accounts table.
#[derive(Clone)]
pub struct QuotaRepository {
    pool: PgPool,
}

impl QuotaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for QuotaRepository {
    #[tracing::instrument(skip(self), fields(db.table = "quota_accounts", account_id = %account_id))]
    async fn get_account(&self, account_id: Uuid) -> IngestResult<Option<QuotaAccount>> {
        let row: Option<QuotaAccountRow> = sqlx::query_as::<Postgres, QuotaAccountRow>(
            r#"
            SELECT account_id, COALESCE(used_bytes, 0) AS used_bytes, limit_bytes
            FROM quota_accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(QuotaAccount::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "quota_accounts", account_id = %account_id))]
    async fn apply_update(
        &self,
        account_id: Uuid,
        update: LedgerUpdate,
    ) -> IngestResult<Option<QuotaAccount>> {
        update.validate()?;

        let row: Option<QuotaAccountRow> =
            sqlx::query_as::<Postgres, QuotaAccountRow>(update_statement(&update))
                .bind(account_id)
                .bind(update.delta_bytes())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(QuotaAccount::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "quota_accounts", account_id = %account_id))]
    async fn open_account(&self, account_id: Uuid, limit_bytes: i64) -> IngestResult<QuotaAccount> {
        sqlx::query(
            r#"
            INSERT INTO quota_accounts (account_id, used_bytes, limit_bytes)
            VALUES ($1, 0, $2)
            ON CONFLICT (account_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(limit_bytes)
        .execute(&self.pool)
        .await?;

        let row: QuotaAccountRow = sqlx::query_as::<Postgres, QuotaAccountRow>(
            r#"
            SELECT account_id, COALESCE(used_bytes, 0) AS used_bytes, limit_bytes
            FROM quota_accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}
