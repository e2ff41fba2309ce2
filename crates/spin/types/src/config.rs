use serde::{Deserialize, Serialize};

use crate::account::Amount;

/// Token metadata and genesis supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Minted to the creator at genesis, in smallest units.
    #[serde(default = "default_initial_supply", with = "crate::account::amount_serde")]
    pub initial_supply: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: default_initial_supply(),
        }
    }
}

fn default_name() -> String {
    "SPIN Protocol".to_string()
}

fn default_symbol() -> String {
    "SPIN".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_initial_supply() -> Amount {
    1_250_000_000 * 10u128.pow(18)
}
