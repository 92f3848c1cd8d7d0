use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::models::ledger::StockItem;
use crate::retry::{RetryPolicy, with_retry};

/// The stock queue: reward payloads waiting to be claimed, in arrival
/// order. Claiming is a single conditional UPDATE, so an item can only
/// ever go to one caller.
#[derive(Debug, Clone)]
pub struct InventoryService {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl InventoryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Append a reward payload; ids are monotonically increasing.
    pub async fn add_item(&self, payload: &str) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        let id = with_retry(&self.retry, "add_item", || {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO stock_items (payload) VALUES (?) RETURNING id",
                )
                .bind(payload)
                .fetch_one(&pool)
                .await
            }
        })
        .await?;
        info!("Added stock item {}", id);
        Ok(id)
    }

    pub async fn peek_oldest_unclaimed(&self) -> Result<Option<StockItem>, LedgerError> {
        let pool = self.pool.clone();
        with_retry(&self.retry, "peek_oldest_unclaimed", || {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, StockItem>(
                    "SELECT * FROM stock_items WHERE claimed = 0 ORDER BY id LIMIT 1",
                )
                .fetch_optional(&pool)
                .await
            }
        })
        .await
    }

    /// Atomically take the oldest unclaimed item, or None if the queue
    /// is empty. The select-and-mark is one statement; two concurrent
    /// callers can never receive the same item.
    pub async fn claim_oldest_unclaimed(&self) -> Result<Option<StockItem>, LedgerError> {
        let now = Utc::now();
        let pool = self.pool.clone();
        let item = with_retry(&self.retry, "claim_oldest_unclaimed", || {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, StockItem>(
                    "UPDATE stock_items SET claimed = 1, claimed_at = ? \
                     WHERE id = (SELECT id FROM stock_items WHERE claimed = 0 ORDER BY id LIMIT 1) \
                     RETURNING id, payload, claimed, claimed_at, created_at",
                )
                .bind(now)
                .fetch_optional(&pool)
                .await
            }
        })
        .await?;
        if let Some(ref item) = item {
            info!("Claimed stock item {}", item.id);
        }
        Ok(item)
    }

    /// Compensation path: return a claimed item to the unclaimed pool.
    /// The id is preserved, so the item regains its original position
    /// at the front of the queue.
    pub async fn release(&self, item_id: i64) -> Result<(), LedgerError> {
        let pool = self.pool.clone();
        let released = with_retry(&self.retry, "release", || {
            let pool = pool.clone();
            async move {
                sqlx::query(
                    "UPDATE stock_items SET claimed = 0, claimed_at = NULL \
                     WHERE id = ? AND claimed = 1",
                )
                .bind(item_id)
                .execute(&pool)
                .await
            }
        })
        .await?
        .rows_affected()
            == 1;

        if released {
            info!("Released stock item {} back to the queue", item_id);
        } else {
            warn!("Release of stock item {} matched no claimed row", item_id);
        }
        Ok(())
    }

    /// Unclaimed item count.
    pub async fn count(&self) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        with_retry(&self.retry, "count", || {
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_items WHERE claimed = 0")
                    .fetch_one(&pool)
                    .await
            }
        })
        .await
    }

    pub async fn list_unclaimed(&self) -> Result<Vec<StockItem>, LedgerError> {
        let pool = self.pool.clone();
        with_retry(&self.retry, "list_unclaimed", || {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, StockItem>(
                    "SELECT * FROM stock_items WHERE claimed = 0 ORDER BY id",
                )
                .fetch_all(&pool)
                .await
            }
        })
        .await
    }
}
