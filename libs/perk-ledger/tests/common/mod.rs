use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use perk_ledger::config::LedgerConfig;
use perk_ledger::retry::RetryPolicy;
use perk_ledger::services::{AccountService, InventoryService, RedemptionService};

static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// File-backed scratch database in WAL mode, so concurrent connections
/// behave as they do in production. A fresh file per test keeps tests
/// independent.
pub async fn setup_pool() -> SqlitePool {
    let path = std::env::temp_dir().join(format!(
        "perk-ledger-test-{}-{}.db",
        std::process::id(),
        DB_COUNTER.fetch_add(1, Ordering::Relaxed),
    ));
    let _ = std::fs::remove_file(&path);

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("failed to open test database");

    perk_ledger::MIGRATOR
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 10,
        base_delay: Duration::from_millis(5),
    }
}

pub fn accounts(pool: &SqlitePool) -> AccountService {
    AccountService::new(pool.clone(), LedgerConfig::default()).with_policy(test_policy())
}

pub fn inventory(pool: &SqlitePool) -> InventoryService {
    InventoryService::new(pool.clone()).with_policy(test_policy())
}

pub fn redemptions(pool: &SqlitePool) -> RedemptionService {
    RedemptionService::new(accounts(pool), inventory(pool))
}
