//! Phased, capped crowdsale over the SPIN ledger.
//!
//! The [`Crowdsale`] owns the [`Ledger`] and a holding account of its own.
//! Tokens for sale and for vesting are transferred to the holding account
//! up front; purchases and vesting grants move them out as time-locks.
//!
//! Components:
//! - [`AccessControl`]: admins and the purchase whitelist
//! - phases and caps: the sale window state machine and funding limits
//! - purchase pipeline: validate, move and lock tokens, then forward funds
//! - vesting: four equal tranches per beneficiary
//! - withdrawals: unsold tokens and held native funds back to an admin
//!
//! Native value leaves the sale only through the [`FundsTransfer`] seam, and
//! only after the internal state change is in place. A failed transfer rolls
//! the whole operation back, and so does dropping the operation's future
//! before the transfer completes.

pub mod access;
pub mod caps;
pub mod config;
pub mod error;
pub mod funds;
mod pending;
pub mod phase;
pub mod sale;
pub mod vesting;
pub mod withdraw;

use std::sync::Arc;

use spin_ledger::Ledger;
use spin_types::{AccountId, Amount};
use tracing::info;

pub use access::AccessControl;
pub use caps::Caps;
pub use config::SaleConfig;
pub use error::{Asset, SaleError};
pub use funds::{FundsError, FundsTransfer, NativeBank};
pub use phase::{Phase, SaleState};
pub use sale::Purchase;
pub use vesting::{tranches, VESTING_TRANCHES};

/// The crowdsale controller.
pub struct Crowdsale {
    ledger: Ledger,
    address: AccountId,
    wallet: AccountId,
    funds: Arc<dyn FundsTransfer>,
    config: SaleConfig,
    access: AccessControl,
    phase: Option<Phase>,
    caps: Caps,
    raised: Amount,
    funds_held: Amount,
    entered: bool,
}

impl Crowdsale {
    /// Open a sale owned by `owner`, forwarding funds to `wallet`.
    ///
    /// Passing the sale's own [`Crowdsale::holding_address`] as `wallet`
    /// keeps received funds on the sale until withdrawn.
    pub fn new(
        ledger: Ledger,
        owner: AccountId,
        wallet: AccountId,
        funds: Arc<dyn FundsTransfer>,
        config: SaleConfig,
    ) -> Self {
        let address = Self::holding_address(&owner);
        let caps = Caps::with_total(config.total_sale_cap);
        info!(
            owner = %owner,
            wallet = %wallet,
            address = %address,
            rate = config.rate,
            total_sale_cap = config.total_sale_cap,
            "Crowdsale created"
        );
        Self {
            ledger,
            address,
            wallet,
            funds,
            config,
            access: AccessControl::new(owner),
            phase: None,
            caps,
            raised: 0,
            funds_held: 0,
            entered: false,
        }
    }

    /// Ledger account holding the tokens of the sale opened by `owner`.
    pub fn holding_address(owner: &AccountId) -> AccountId {
        AccountId::derive(&format!("spin-crowdsale:{owner}"))
    }

    /// The sale's own ledger account.
    pub fn address(&self) -> AccountId {
        self.address
    }

    /// Collector of purchase funds.
    pub fn wallet(&self) -> AccountId {
        self.wallet
    }

    /// The ledger being sold.
    pub fn token(&self) -> &Ledger {
        &self.ledger
    }

    pub fn token_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    /// Give the ledger back, ending the sale.
    pub fn into_token(self) -> Ledger {
        self.ledger
    }
}
