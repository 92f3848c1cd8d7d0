use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::LedgerError;

/// Bounded retry with linear backoff for transiently-busy store errors.
///
/// SQLite serializes writers, so under contention a statement can fail
/// with SQLITE_BUSY even inside the connection's busy_timeout. The
/// policy retries only that class of error; everything else surfaces
/// immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): linear schedule.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// True for errors worth retrying: the store is locked or the pool is
/// saturated, and a later attempt may succeed.
pub fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            // SQLITE_BUSY = 5, SQLITE_BUSY_SNAPSHOT = 517
            matches!(db.code().as_deref(), Some("5") | Some("517"))
                || db.message().contains("database is locked")
        }
        _ => false,
    }
}

/// Run `op` under `policy`, mapping exhaustion (or a non-retryable
/// store error) to [`LedgerError::StoreUnavailable`].
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_busy(&err) && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} hit busy store (attempt {}/{}), retrying in {:?}: {}",
                    op_name, attempt, policy.max_attempts, delay, err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(LedgerError::StoreUnavailable {
                    attempts: attempt,
                    source: err,
                });
            }
        }
    }
}
