#![allow(dead_code)]

use std::sync::Arc;

use spin_crowdsale::{Crowdsale, NativeBank, SaleConfig};
use spin_ledger::Ledger;
use spin_types::{AccountId, Amount, Clock, ManualClock, MemoryEventLog, Timestamp, TokenConfig};

pub const GENESIS: Timestamp = 1_700_000_000;
pub const ETHER: Amount = 1_000_000_000_000_000_000;
pub const RATE: Amount = 10;
pub const TOTAL_SALE_CAP: Amount = 10 * ETHER;
pub const VESTING_TOKEN_AMOUNT: Amount = 40_000 * ETHER;
pub const SALE_PERIOD: u64 = 1_000;
pub const BONUS_RATE_BP: u32 = 2_500;
pub const PURCHASED_RELEASE: u64 = 600;
pub const BONUS_RELEASE: u64 = 1_200;
pub const VESTING_INTERVAL: u64 = 3_600;

pub fn creator() -> AccountId {
    AccountId::derive("creator")
}

pub fn wallet() -> AccountId {
    AccountId::derive("wallet")
}

pub fn funder() -> AccountId {
    AccountId::derive("funder")
}

pub fn third_party() -> AccountId {
    AccountId::derive("third-party")
}

pub fn third_party_alt() -> AccountId {
    AccountId::derive("third-party-alt")
}

pub struct Deployment {
    pub sale: Crowdsale,
    pub clock: ManualClock,
    pub log: MemoryEventLog,
    pub bank: NativeBank,
}

impl Deployment {
    /// Token and sale as deployed for the sale test-net: the sale holds the
    /// full allotment plus the vesting reserve.
    pub fn new() -> Self {
        Self::with_config(SaleConfig {
            rate: RATE,
            total_sale_cap: TOTAL_SALE_CAP,
            purchased_release_period_secs: PURCHASED_RELEASE,
            bonus_release_period_secs: BONUS_RELEASE,
            vesting_interval_secs: VESTING_INTERVAL,
        })
    }

    pub fn with_config(config: SaleConfig) -> Self {
        let clock = ManualClock::new(GENESIS);
        let log = MemoryEventLog::new();
        let bank = NativeBank::new();
        let ledger = Ledger::new(
            &TokenConfig::default(),
            creator(),
            Arc::new(clock.clone()),
            Arc::new(log.clone()),
        );
        let allotment = config.total_sale_cap * config.rate + VESTING_TOKEN_AMOUNT;
        let mut sale = Crowdsale::new(ledger, creator(), wallet(), Arc::new(bank.clone()), config);
        let address = sale.address();
        sale.token_mut()
            .transfer(&creator(), &address, allotment)
            .expect("fund the sale");
        Self {
            sale,
            clock,
            log,
            bank,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Whitelist `buyers`, set a phase starting in 10s and move 20s forward.
    pub fn start_phase(&mut self, buyers: &[AccountId]) {
        self.sale
            .add_whitelist(&creator(), buyers)
            .expect("whitelist");
        let start = self.now() + 10;
        self.sale
            .set_phase(&creator(), RATE, start, start + SALE_PERIOD, BONUS_RATE_BP)
            .expect("set phase");
        self.clock.advance(20);
        assert!(self.sale.is_active());
    }

    pub fn held(&self) -> Amount {
        self.sale.token().balance_of(&self.sale.address())
    }
}
