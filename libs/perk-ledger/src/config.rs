use std::env;

/// Tunable amounts for the ledger, read from the environment with the
/// production defaults baked in.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Points credited to the referrer when a referred account is created.
    pub referral_bonus: i64,
    /// Points granted by a successful daily bonus claim.
    pub daily_bonus: i64,
    /// Minimum seconds between two bonus claims on one account.
    pub bonus_period_secs: i64,
    /// Points debited per redemption.
    pub redeem_cost: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            referral_bonus: 3,
            daily_bonus: 2,
            bonus_period_secs: 86_400,
            redeem_cost: 7,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            referral_bonus: env_i64("REFERRAL_BONUS", defaults.referral_bonus),
            daily_bonus: env_i64("DAILY_BONUS", defaults.daily_bonus),
            bonus_period_secs: env_i64("BONUS_PERIOD_SECS", defaults.bonus_period_secs),
            redeem_cost: env_i64("REDEEM_COST", defaults.redeem_cost),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
