use serde::{Deserialize, Serialize};
use spin_types::account::amount_serde;
use spin_types::Amount;

/// Crowdsale deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Ledger units per funding unit until the first phase sets its own.
    #[serde(default = "default_rate", with = "amount_serde")]
    pub rate: Amount,

    /// Cumulative funding ceiling, in smallest funding units.
    #[serde(default = "default_total_sale_cap", with = "amount_serde")]
    pub total_sale_cap: Amount,

    #[serde(default = "default_purchased_release_period")]
    pub purchased_release_period_secs: u64,

    #[serde(default = "default_bonus_release_period")]
    pub bonus_release_period_secs: u64,

    /// Spacing between the four vesting tranches.
    #[serde(default = "default_vesting_interval")]
    pub vesting_interval_secs: u64,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            total_sale_cap: default_total_sale_cap(),
            purchased_release_period_secs: default_purchased_release_period(),
            bonus_release_period_secs: default_bonus_release_period(),
            vesting_interval_secs: default_vesting_interval(),
        }
    }
}

fn default_rate() -> Amount {
    10
}

fn default_total_sale_cap() -> Amount {
    10 * 10u128.pow(18)
}

fn default_purchased_release_period() -> u64 {
    600
}

fn default_bonus_release_period() -> u64 {
    1_200
}

fn default_vesting_interval() -> u64 {
    3_600
}
