use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub user_id: i64,
    pub username: Option<String>,
    pub balance: i64,
    pub referred_by: Option<i64>,
    pub last_bonus_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockItem {
    pub id: i64,
    pub payload: String,
    pub claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of a daily bonus attempt.
#[derive(Debug, Clone, Serialize)]
pub struct BonusOutcome {
    pub granted: bool,
    /// Seconds until the next claim becomes available. 0 when granted.
    pub remaining_seconds: i64,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub item: StockItem,
    pub new_balance: i64,
}
