use tracing::{error, info};

use crate::error::LedgerError;
use crate::models::ledger::Redemption;
use crate::services::account_service::AccountService;
use crate::services::inventory_service::InventoryService;

/// Exchanges balance points for the oldest unclaimed stock item.
///
/// The claim happens before the debit: a claimed item can always be
/// put back, while points debited against an empty queue cannot be
/// returned without a second race window. If the debit fails the claim
/// is released; if that release also fails the item is stuck in the
/// claimed state and the caller gets `CompensationFailed` so an
/// operator can be alerted.
#[derive(Debug, Clone)]
pub struct RedemptionService {
    accounts: AccountService,
    inventory: InventoryService,
}

impl RedemptionService {
    pub fn new(accounts: AccountService, inventory: InventoryService) -> Self {
        Self { accounts, inventory }
    }

    pub async fn redeem(&self, user_id: i64, cost: i64) -> Result<Redemption, LedgerError> {
        let Some(item) = self.inventory.claim_oldest_unclaimed().await? else {
            return Err(LedgerError::OutOfStock);
        };

        match self.accounts.adjust_balance(user_id, -cost).await {
            Ok(new_balance) => {
                info!(
                    "User {} redeemed item {} for {} points (balance now {})",
                    user_id, item.id, cost, new_balance
                );
                Ok(Redemption { item, new_balance })
            }
            Err(debit_err) => {
                let item_id = item.id;
                match self.inventory.release(item_id).await {
                    Ok(()) => Err(debit_err),
                    Err(release_err) => {
                        error!(
                            "Compensation failed for stock item {}: debit error {}, release error {}",
                            item_id, debit_err, release_err
                        );
                        Err(LedgerError::CompensationFailed {
                            item_id,
                            source: Box::new(release_err),
                        })
                    }
                }
            }
        }
    }
}
