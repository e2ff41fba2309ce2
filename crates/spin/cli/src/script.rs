//! Operation scripts replayed by spinctl.
//!
//! A script is a JSON document `{ "steps": [ ... ] }`. Each step is an object
//! with a single key naming the operation:
//!
//! ```json
//! { "steps": [
//!     { "whitelist": { "caller": "creator", "accounts": ["alice"] } },
//!     { "set_phase": { "caller": "creator", "rate": "10", "start_in_secs": 10,
//!                      "duration_secs": 1000, "bonus_rate_bp": 2500 } },
//!     { "advance": { "secs": 20 } },
//!     { "purchase": { "buyer": "alice", "funding": "2000000000000000000" } }
//! ] }
//! ```
//!
//! Accounts are labels or `0x` hex keys; amounts are strings or integers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spin_types::account::amount_serde;
use spin_types::{Amount, Timestamp};

use crate::error::CliResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Keep going after a failed step instead of stopping.
    #[serde(default)]
    pub continue_on_error: bool,

    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestGrant {
    pub account: String,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Advance {
        secs: u64,
    },
    AdvanceTo {
        at: Timestamp,
    },
    Transfer {
        from: String,
        to: String,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    /// Transfer from `from` to the sale's holding account.
    FundSale {
        from: String,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    Mint {
        caller: String,
        to: String,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    Pause {
        caller: String,
    },
    Unpause {
        caller: String,
    },
    Lock {
        caller: String,
        reason: String,
        #[serde(with = "amount_serde")]
        amount: Amount,
        period: u64,
    },
    Unlock {
        account: String,
    },
    AddAdmin {
        caller: String,
        account: String,
    },
    Whitelist {
        caller: String,
        accounts: Vec<String>,
    },
    RemoveWhitelist {
        caller: String,
        account: String,
    },
    /// Phase window relative to the clock when the step runs.
    SetPhase {
        caller: String,
        #[serde(with = "amount_serde")]
        rate: Amount,
        start_in_secs: u64,
        duration_secs: u64,
        #[serde(default)]
        bonus_rate_bp: u32,
    },
    SetIndividualCaps {
        caller: String,
        #[serde(with = "amount_serde")]
        min: Amount,
        #[serde(with = "amount_serde")]
        max: Amount,
    },
    SetTotalSaleCap {
        caller: String,
        #[serde(with = "amount_serde")]
        cap: Amount,
    },
    Purchase {
        buyer: String,
        #[serde(with = "amount_serde")]
        funding: Amount,
    },
    Release {
        accounts: Vec<String>,
    },
    Vest {
        caller: String,
        grants: Vec<VestGrant>,
    },
    WithdrawToken {
        caller: String,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
    WithdrawEther {
        caller: String,
        #[serde(with = "amount_serde")]
        amount: Amount,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Advance { .. } => "advance",
            Step::AdvanceTo { .. } => "advance_to",
            Step::Transfer { .. } => "transfer",
            Step::FundSale { .. } => "fund_sale",
            Step::Mint { .. } => "mint",
            Step::Pause { .. } => "pause",
            Step::Unpause { .. } => "unpause",
            Step::Lock { .. } => "lock",
            Step::Unlock { .. } => "unlock",
            Step::AddAdmin { .. } => "add_admin",
            Step::Whitelist { .. } => "whitelist",
            Step::RemoveWhitelist { .. } => "remove_whitelist",
            Step::SetPhase { .. } => "set_phase",
            Step::SetIndividualCaps { .. } => "set_individual_caps",
            Step::SetTotalSaleCap { .. } => "set_total_sale_cap",
            Step::Purchase { .. } => "purchase",
            Step::Release { .. } => "release",
            Step::Vest { .. } => "vest",
            Step::WithdrawToken { .. } => "withdraw_token",
            Step::WithdrawEther { .. } => "withdraw_ether",
        }
    }
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_path(path: &Path) -> CliResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&source)?)
    }
}
