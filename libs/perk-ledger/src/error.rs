use thiserror::Error;

/// Errors surfaced by the ledger operations.
///
/// `InsufficientFunds` and `OutOfStock` are user-facing and leave the
/// store untouched. `StoreUnavailable` means the bounded retry policy
/// was exhausted. `CompensationFailed` is the one operator-alert case:
/// a stock item was claimed but the matching debit could not complete
/// and the claim could not be released, so the item is leaked until an
/// operator intervenes.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient funds: balance {balance} is below required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("no unclaimed stock available")]
    OutOfStock,

    #[error("account {0} does not exist")]
    AccountNotFound(i64),

    #[error("store unavailable after {attempts} attempt(s)")]
    StoreUnavailable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("compensation failed: stock item {item_id} remains claimed but unpaid")]
    CompensationFailed {
        item_id: i64,
        #[source]
        source: Box<LedgerError>,
    },
}
