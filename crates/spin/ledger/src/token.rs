//! Fungible token surface: transfers, allowances, supply changes, pausing
//! and role management.

use spin_types::{AccountId, Amount, Event, Role};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::Ledger;

impl Ledger {
    pub fn transfer(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        self.move_tokens(caller, to, amount)
    }

    pub fn approve(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        self.store.set_allowance(caller, spender, amount);
        self.emit(Event::Approval {
            owner: *caller,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    /// Move `owner`'s tokens to `to`, spending the caller's allowance.
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        let remaining = self.checked_allowance(owner, caller, amount)?;
        self.move_tokens(owner, to, amount)?;
        self.store.set_allowance(owner, caller, remaining);
        self.emit(Event::Approval {
            owner: *owner,
            spender: *caller,
            amount: remaining,
        });
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        added: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        let updated = self
            .store
            .allowance(caller, spender)
            .checked_add(added)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.store.set_allowance(caller, spender, updated);
        self.emit(Event::Approval {
            owner: *caller,
            spender: *spender,
            amount: updated,
        });
        Ok(())
    }

    /// Fails with `InsufficientAllowance` rather than going below zero.
    pub fn decrease_allowance(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        subtracted: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        let updated = self.checked_allowance(caller, spender, subtracted)?;
        self.store.set_allowance(caller, spender, updated);
        self.emit(Event::Approval {
            owner: *caller,
            spender: *spender,
            amount: updated,
        });
        Ok(())
    }

    pub fn mint(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        self.store.ensure_role(Role::Minter, caller)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        let supply = self
            .store
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.store.set_total_supply(supply);
        self.store.credit(to, amount);
        info!(to = %to, amount, supply, "Minted");
        self.emit(Event::Transfer {
            from: AccountId::ZERO,
            to: *to,
            amount,
        });
        Ok(())
    }

    pub fn burn(&mut self, caller: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        self.burn_tokens(caller, amount)
    }

    /// Burn `owner`'s tokens, spending the caller's allowance.
    pub fn burn_from(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.store.ensure_not_paused()?;
        let remaining = self.checked_allowance(owner, caller, amount)?;
        self.burn_tokens(owner, amount)?;
        self.store.set_allowance(owner, caller, remaining);
        self.emit(Event::Approval {
            owner: *owner,
            spender: *caller,
            amount: remaining,
        });
        Ok(())
    }

    pub fn pause(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.store.ensure_role(Role::Pauser, caller)?;
        self.store.ensure_not_paused()?;
        self.store.set_paused(true);
        warn!(by = %caller, "Ledger paused");
        self.emit(Event::Paused { by: *caller });
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.store.ensure_role(Role::Pauser, caller)?;
        if !self.store.paused {
            return Err(LedgerError::NotPaused);
        }
        self.store.set_paused(false);
        info!(by = %caller, "Ledger unpaused");
        self.emit(Event::Unpaused { by: *caller });
        Ok(())
    }

    /// Role holders may extend their role to other accounts. Idempotent.
    pub fn grant_role(
        &mut self,
        caller: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> Result<(), LedgerError> {
        self.store.ensure_role(role, caller)?;
        if self.store.role_holders_mut(role).insert(*account) {
            info!(role = %role, account = %account, by = %caller, "Role granted");
            self.emit(Event::RoleGranted {
                role,
                account: *account,
            });
        }
        Ok(())
    }

    pub fn add_minter(&mut self, caller: &AccountId, account: &AccountId) -> Result<(), LedgerError> {
        self.grant_role(caller, Role::Minter, account)
    }

    pub fn add_pauser(&mut self, caller: &AccountId, account: &AccountId) -> Result<(), LedgerError> {
        self.grant_role(caller, Role::Pauser, account)
    }

    /// Drop the caller's own role.
    pub fn renounce_role(&mut self, caller: &AccountId, role: Role) -> Result<(), LedgerError> {
        self.store.ensure_role(role, caller)?;
        self.store.role_holders_mut(role).remove(caller);
        info!(role = %role, account = %caller, "Role renounced");
        self.emit(Event::RoleRenounced {
            role,
            account: *caller,
        });
        Ok(())
    }

    pub fn renounce_minter(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.renounce_role(caller, Role::Minter)
    }

    pub fn renounce_pauser(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.renounce_role(caller, Role::Pauser)
    }

    fn move_tokens(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        self.store.ensure_funds(from, amount)?;
        self.store.debit(from, amount);
        self.store.credit(to, amount);
        debug!(from = %from, to = %to, amount, "Transfer");
        self.emit(Event::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    fn burn_tokens(&mut self, owner: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.store.ensure_funds(owner, amount)?;
        self.store.debit(owner, amount);
        let supply = self.store.total_supply - amount;
        self.store.set_total_supply(supply);
        info!(owner = %owner, amount, supply = self.store.total_supply, "Burned");
        self.emit(Event::Transfer {
            from: *owner,
            to: AccountId::ZERO,
            amount,
        });
        Ok(())
    }

    /// Allowance left after spending `amount`, or `InsufficientAllowance`.
    fn checked_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let available = self.store.allowance(owner, spender);
        available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                requested: amount,
                available,
            })
    }
}
