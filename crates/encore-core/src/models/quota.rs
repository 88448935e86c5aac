use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IngestError, IngestResult};

/// Per-account byte usage against a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaAccount {
    pub account_id: Uuid,
    pub used_bytes: i64,
    pub limit_bytes: i64,
}

impl QuotaAccount {
    pub fn remaining_bytes(&self) -> i64 {
        self.limit_bytes.saturating_sub(self.used_bytes).max(0)
    }

    /// Accept when `used + delta <= limit`; equality is allowed.
    pub fn check(&self, delta_bytes: i64) -> IngestResult<()> {
        if self.used_bytes.saturating_add(delta_bytes) > self.limit_bytes {
            return Err(IngestError::quota_exceeded(
                self.used_bytes,
                self.limit_bytes,
                delta_bytes,
            ));
        }
        Ok(())
    }
}

/// The only mutations the ledger may apply to `used_bytes`.
///
/// Each one is executed by the persistence layer as a single server-side statement;
/// [`LedgerUpdate::apply`] is the in-memory equivalent of that statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerUpdate {
    /// `used = COALESCE(used, 0) + delta`
    Increment(i64),
    /// `used = GREATEST(0, COALESCE(used, 0) - delta)`
    Decrement(i64),
    /// `used = COALESCE(used, 0) + delta WHERE COALESCE(used, 0) + delta <= limit`
    ReserveWithinLimit(i64),
}

impl LedgerUpdate {
    pub fn delta_bytes(&self) -> i64 {
        match *self {
            LedgerUpdate::Increment(d)
            | LedgerUpdate::Decrement(d)
            | LedgerUpdate::ReserveWithinLimit(d) => d,
        }
    }

    /// Rejects negative deltas before they reach a store.
    pub fn validate(&self) -> IngestResult<()> {
        if self.delta_bytes() < 0 {
            return Err(IngestError::Validation(format!(
                "Ledger delta must be non-negative, got {}",
                self.delta_bytes()
            )));
        }
        Ok(())
    }

    /// New `used_bytes`, or `None` when a conditional reservation does not fit.
    pub fn apply(&self, used_bytes: Option<i64>, limit_bytes: i64) -> Option<i64> {
        let used = used_bytes.unwrap_or(0);
        match *self {
            LedgerUpdate::Increment(delta) => Some(used.saturating_add(delta)),
            LedgerUpdate::Decrement(delta) => Some(used.saturating_sub(delta).max(0)),
            LedgerUpdate::ReserveWithinLimit(delta) => {
                let next = used.saturating_add(delta);
                (next <= limit_bytes).then_some(next)
            }
        }
    }
}

/// How `check_and_reserve` guards the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaMode {
    /// Read-and-compare without mutating; the ledger is incremented after the record is persisted.
    #[default]
    Check,
    /// Single conditional update at check time; released on compensation.
    Reserve,
}

impl FromStr for QuotaMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "check" => Ok(QuotaMode::Check),
            "reserve" => Ok(QuotaMode::Reserve),
            _ => Err(anyhow::anyhow!("Invalid quota mode: {}", s)),
        }
    }
}

impl Display for QuotaMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            QuotaMode::Check => write!(f, "check"),
            QuotaMode::Reserve => write!(f, "reserve"),
        }
    }
}
