use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::models::ledger::{Account, BonusOutcome};
use crate::retry::{RetryPolicy, with_retry};

/// Per-user balances and referral/bonus bookkeeping.
///
/// Every mutation is a single guarded UPDATE so that concurrent
/// callers interleave safely; nothing here does a read-modify-write
/// across two round trips.
#[derive(Debug, Clone)]
pub struct AccountService {
    pool: SqlitePool,
    config: LedgerConfig,
    retry: RetryPolicy,
}

impl AccountService {
    pub fn new(pool: SqlitePool, config: LedgerConfig) -> Self {
        Self {
            pool,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn get_account(&self, user_id: i64) -> Result<Option<Account>, LedgerError> {
        let pool = self.pool.clone();
        with_retry(&self.retry, "get_account", || {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&pool)
                    .await
            }
        })
        .await
    }

    /// Balance for `user_id`; 0 for accounts that do not exist yet.
    pub async fn get_balance(&self, user_id: i64) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        let balance = with_retry(&self.retry, "get_balance", || {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>("SELECT balance FROM accounts WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&pool)
                    .await
            }
        })
        .await?;
        Ok(balance.unwrap_or(0))
    }

    /// Idempotent account creation. Returns true when the row was newly
    /// created. A referrer is recorded only on genuine creation, only
    /// if that referrer already has an account and is not the new user
    /// itself; the referral credit then fires exactly once, as a
    /// separate atomic step after the new row is committed.
    pub async fn ensure_account(
        &self,
        user_id: i64,
        username: Option<&str>,
        referrer_id: Option<i64>,
    ) -> Result<bool, LedgerError> {
        let referrer = match referrer_id {
            Some(r) if r != user_id && self.get_account(r).await?.is_some() => Some(r),
            _ => None,
        };

        let pool = self.pool.clone();
        let created = with_retry(&self.retry, "ensure_account", || {
            let pool = pool.clone();
            async move {
                sqlx::query(
                    "INSERT INTO accounts (user_id, username, referred_by) VALUES (?, ?, ?) \
                     ON CONFLICT(user_id) DO NOTHING",
                )
                .bind(user_id)
                .bind(username)
                .bind(referrer)
                .execute(&pool)
                .await
            }
        })
        .await?
        .rows_affected()
            == 1;

        if created {
            info!("Created account {}", user_id);
            if let Some(referrer) = referrer {
                let bonus = self.config.referral_bonus;
                self.adjust_balance(referrer, bonus).await?;
                info!("Credited referral bonus {} to {}", bonus, referrer);
            }
        }

        Ok(created)
    }

    /// Apply `delta` (positive or negative) atomically, refusing any
    /// debit that would take the balance below zero. Returns the new
    /// balance.
    pub async fn adjust_balance(&self, user_id: i64, delta: i64) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        let new_balance = with_retry(&self.retry, "adjust_balance", || {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(
                    "UPDATE accounts SET balance = balance + ? \
                     WHERE user_id = ? AND balance + ? >= 0 \
                     RETURNING balance",
                )
                .bind(delta)
                .bind(user_id)
                .bind(delta)
                .fetch_optional(&pool)
                .await
            }
        })
        .await?;

        match new_balance {
            Some(balance) => Ok(balance),
            None => match self.get_account(user_id).await? {
                Some(account) => Err(LedgerError::InsufficientFunds {
                    balance: account.balance,
                    required: -delta,
                }),
                None => Err(LedgerError::AccountNotFound(user_id)),
            },
        }
    }

    /// Grant the daily bonus if the account's last claim is at least
    /// one full period in the past. The period check and the credit
    /// are one guarded UPDATE, so two concurrent claims can never both
    /// succeed.
    pub async fn try_claim_daily_bonus(&self, user_id: i64) -> Result<BonusOutcome, LedgerError> {
        let now = Utc::now();
        let period = self.config.bonus_period_secs;
        let cutoff = now - Duration::seconds(period);
        let bonus = self.config.daily_bonus;

        let pool = self.pool.clone();
        let granted = with_retry(&self.retry, "try_claim_daily_bonus", || {
            let pool = pool.clone();
            async move {
                sqlx::query(
                    "UPDATE accounts SET balance = balance + ?, last_bonus_at = ? \
                     WHERE user_id = ? AND (last_bonus_at IS NULL OR last_bonus_at <= ?)",
                )
                .bind(bonus)
                .bind(now)
                .bind(user_id)
                .bind(cutoff)
                .execute(&pool)
                .await
            }
        })
        .await?
        .rows_affected()
            == 1;

        if granted {
            info!("Granted daily bonus {} to {}", bonus, user_id);
            return Ok(BonusOutcome {
                granted: true,
                remaining_seconds: 0,
            });
        }

        let account = self
            .get_account(user_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;
        let remaining = match account.last_bonus_at {
            Some(last) => period - (now - last).num_seconds(),
            // Lost a race against a concurrent claim; a full period remains.
            None => period,
        };
        Ok(BonusOutcome {
            granted: false,
            remaining_seconds: remaining.clamp(1, period),
        })
    }

    /// How many accounts name `user_id` as their referrer.
    pub async fn referral_count(&self, user_id: i64) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        with_retry(&self.retry, "referral_count", || {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM accounts WHERE referred_by = ?",
                )
                .bind(user_id)
                .fetch_one(&pool)
                .await
            }
        })
        .await
    }

    pub async fn total_accounts(&self) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        with_retry(&self.retry, "total_accounts", || {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
                    .fetch_one(&pool)
                    .await
            }
        })
        .await
    }
}
