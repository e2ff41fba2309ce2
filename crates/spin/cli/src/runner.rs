//! Replays a [`Script`] against an in-memory deployment.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use spin_crowdsale::{Caps, Crowdsale, NativeBank, SaleState};
use spin_ledger::Ledger;
use spin_types::account::amount_serde;
use spin_types::{
    AccountId, Amount, Clock, EventRecord, EventSink, LockReason, ManualClock, MemoryEventLog,
    SystemClock, Timestamp, TracingSink,
};
use tracing::{info, warn};

use crate::config::{resolve_account, DeploymentConfig};
use crate::error::CliResult;
use crate::script::{Script, Step};

/// Publishes every record to each inner sink in order.
struct Fanout(Vec<Arc<dyn EventSink>>);

impl EventSink for Fanout {
    fn publish(&self, record: &EventRecord) {
        for sink in &self.0 {
            sink.publish(record);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub label: String,
    pub account: AccountId,
    #[serde(with = "amount_serde")]
    pub balance: Amount,
    #[serde(with = "amount_serde")]
    pub total_balance: Amount,
    #[serde(with = "amount_serde")]
    pub native_funds: Amount,
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub now: Timestamp,
    pub sale_state: SaleState,
    pub caps: Caps,
    #[serde(with = "amount_serde")]
    pub raised: Amount,
    #[serde(with = "amount_serde")]
    pub funds_held: Amount,
    #[serde(with = "amount_serde")]
    pub total_supply: Amount,
    pub accounts: Vec<AccountSummary>,
    pub events: Vec<EventRecord>,
}

impl Report {
    pub fn failed(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|outcome| !outcome.ok)
    }
}

pub struct Runner {
    sale: Crowdsale,
    clock: ManualClock,
    log: MemoryEventLog,
    bank: NativeBank,
    labels: BTreeMap<AccountId, String>,
}

impl Runner {
    /// Deploy the token and the sale described by `config`.
    pub fn new(config: &DeploymentConfig) -> Self {
        let genesis = config
            .accounts
            .genesis
            .unwrap_or_else(|| SystemClock.now());
        let clock = ManualClock::new(genesis);
        let log = MemoryEventLog::new();
        let bank = NativeBank::new();

        let sink = Fanout(vec![Arc::new(log.clone()), Arc::new(TracingSink)]);
        let creator = config.creator();
        let ledger = Ledger::new(&config.token, creator, Arc::new(clock.clone()), Arc::new(sink));
        let wallet = config
            .wallet()
            .unwrap_or_else(|| Crowdsale::holding_address(&creator));
        let sale = Crowdsale::new(
            ledger,
            creator,
            wallet,
            Arc::new(bank.clone()),
            config.sale.clone(),
        );

        let mut labels = BTreeMap::new();
        labels.insert(creator, config.accounts.creator.clone());
        labels.insert(sale.address(), "sale".to_string());
        if let Some(name) = &config.accounts.wallet {
            labels.insert(wallet, name.clone());
        }

        info!(genesis, creator = %creator, sale = %sale.address(), "Deployment ready");
        Self {
            sale,
            clock,
            log,
            bank,
            labels,
        }
    }

    pub fn sale(&self) -> &Crowdsale {
        &self.sale
    }

    /// Run every step, stopping at the first failure unless the script says
    /// otherwise.
    pub async fn run(&mut self, script: &Script) -> Report {
        let mut outcomes = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let result = self.apply(step).await;
            let error = result.err().map(|err| err.to_string());
            if let Some(error) = &error {
                warn!(index, step = step.name(), error = %error, "Step failed");
            }
            let failed = error.is_some();
            outcomes.push(StepOutcome {
                index,
                step: step.name().to_string(),
                ok: !failed,
                error,
            });
            if failed && !script.continue_on_error {
                break;
            }
        }
        self.report(outcomes)
    }

    async fn apply(&mut self, step: &Step) -> CliResult<()> {
        match step {
            Step::Advance { secs } => {
                self.clock.advance(*secs);
            }
            Step::AdvanceTo { at } => {
                self.clock.advance_to(*at);
            }
            Step::Transfer { from, to, amount } => {
                let (from, to) = (self.account(from), self.account(to));
                self.sale.token_mut().transfer(&from, &to, *amount)?;
            }
            Step::FundSale { from, amount } => {
                let from = self.account(from);
                let address = self.sale.address();
                self.sale.token_mut().transfer(&from, &address, *amount)?;
            }
            Step::Mint { caller, to, amount } => {
                let (caller, to) = (self.account(caller), self.account(to));
                self.sale.token_mut().mint(&caller, &to, *amount)?;
            }
            Step::Pause { caller } => {
                let caller = self.account(caller);
                self.sale.token_mut().pause(&caller)?;
            }
            Step::Unpause { caller } => {
                let caller = self.account(caller);
                self.sale.token_mut().unpause(&caller)?;
            }
            Step::Lock {
                caller,
                reason,
                amount,
                period,
            } => {
                let caller = self.account(caller);
                self.sale.token_mut().lock(
                    &caller,
                    LockReason::new(reason.as_str()),
                    *amount,
                    *period,
                )?;
            }
            Step::Unlock { account } => {
                let account = self.account(account);
                self.sale.token_mut().unlock(&account)?;
            }
            Step::AddAdmin { caller, account } => {
                let (caller, account) = (self.account(caller), self.account(account));
                self.sale.add_admin(&caller, &account)?;
            }
            Step::Whitelist { caller, accounts } => {
                let caller = self.account(caller);
                let accounts = self.accounts(accounts);
                self.sale.add_whitelist(&caller, &accounts)?;
            }
            Step::RemoveWhitelist { caller, account } => {
                let (caller, account) = (self.account(caller), self.account(account));
                self.sale.remove_from_whitelist(&caller, &account)?;
            }
            Step::SetPhase {
                caller,
                rate,
                start_in_secs,
                duration_secs,
                bonus_rate_bp,
            } => {
                let caller = self.account(caller);
                let start = self.clock.now().saturating_add(*start_in_secs);
                let end = start.saturating_add(*duration_secs);
                self.sale
                    .set_phase(&caller, *rate, start, end, *bonus_rate_bp)?;
            }
            Step::SetIndividualCaps { caller, min, max } => {
                let caller = self.account(caller);
                self.sale.set_individual_caps(&caller, *min, *max)?;
            }
            Step::SetTotalSaleCap { caller, cap } => {
                let caller = self.account(caller);
                self.sale.set_total_sale_cap(&caller, *cap)?;
            }
            Step::Purchase { buyer, funding } => {
                let buyer = self.account(buyer);
                self.sale.purchase(&buyer, *funding).await?;
            }
            Step::Release { accounts } => {
                let accounts = self.accounts(accounts);
                self.sale.release_tokens(&accounts)?;
            }
            Step::Vest { caller, grants } => {
                let caller = self.account(caller);
                let mut accounts = Vec::with_capacity(grants.len());
                let mut amounts = Vec::with_capacity(grants.len());
                for grant in grants {
                    accounts.push(self.account(&grant.account));
                    amounts.push(grant.amount);
                }
                self.sale
                    .vest_dedicated_tokens(&caller, &accounts, &amounts)?;
            }
            Step::WithdrawToken { caller, amount } => {
                let caller = self.account(caller);
                self.sale.withdraw_token(&caller, *amount)?;
            }
            Step::WithdrawEther { caller, amount } => {
                let caller = self.account(caller);
                self.sale.withdraw_ether(&caller, *amount).await?;
            }
        }
        Ok(())
    }

    fn account(&mut self, name: &str) -> AccountId {
        let account = resolve_account(name);
        self.labels
            .entry(account)
            .or_insert_with(|| name.to_string());
        account
    }

    fn accounts(&mut self, names: &[String]) -> Vec<AccountId> {
        names.iter().map(|name| self.account(name)).collect()
    }

    fn report(&self, steps: Vec<StepOutcome>) -> Report {
        let token = self.sale.token();
        let accounts = self
            .labels
            .iter()
            .map(|(account, label)| AccountSummary {
                label: label.clone(),
                account: *account,
                balance: token.balance_of(account),
                total_balance: token.total_balance_of(account),
                native_funds: self.bank.balance_of(account),
            })
            .collect();
        Report {
            steps,
            now: self.clock.now(),
            sale_state: self.sale.state(),
            caps: self.sale.caps(),
            raised: self.sale.raised_amount(),
            funds_held: self.sale.funds_held(),
            total_supply: token.total_supply(),
            accounts,
            events: self.log.records(),
        }
    }
}
