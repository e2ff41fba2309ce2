//! Admin and whitelist sets.
//!
//! Every privileged crowdsale operation asks [`AccessControl`] once at entry.

use std::collections::BTreeSet;

use spin_types::{AccountId, Event};
use tracing::{info, warn};

use crate::error::SaleError;
use crate::Crowdsale;

#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    admins: BTreeSet<AccountId>,
    whitelist: BTreeSet<AccountId>,
}

impl AccessControl {
    /// `owner` is the first admin.
    pub fn new(owner: AccountId) -> Self {
        Self {
            admins: BTreeSet::from([owner]),
            whitelist: BTreeSet::new(),
        }
    }

    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }

    pub fn is_whitelisted(&self, account: &AccountId) -> bool {
        self.whitelist.contains(account)
    }

    pub fn ensure_admin(&self, account: &AccountId) -> Result<(), SaleError> {
        if self.is_admin(account) {
            Ok(())
        } else {
            warn!(account = %account, "Rejected non-admin caller");
            Err(SaleError::Unauthorized(*account))
        }
    }

    pub fn admins(&self) -> impl Iterator<Item = &AccountId> {
        self.admins.iter()
    }

    pub fn whitelisted(&self) -> impl Iterator<Item = &AccountId> {
        self.whitelist.iter()
    }
}

impl Crowdsale {
    pub fn add_admin(&mut self, caller: &AccountId, account: &AccountId) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        if self.access.admins.insert(*account) {
            info!(admin = %account, by = %caller, "Admin added");
            self.ledger.emit(Event::AdminAdded { account: *account });
        }
        Ok(())
    }

    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.access.is_admin(account)
    }

    /// Adding an already listed account is a no-op.
    pub fn add_to_whitelist(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        self.whitelist_one(account);
        Ok(())
    }

    pub fn add_whitelist(
        &mut self,
        caller: &AccountId,
        accounts: &[AccountId],
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        for account in accounts {
            self.whitelist_one(account);
        }
        Ok(())
    }

    pub fn remove_from_whitelist(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), SaleError> {
        self.access.ensure_admin(caller)?;
        if self.access.whitelist.remove(account) {
            info!(account = %account, "Removed from whitelist");
            self.ledger
                .emit(Event::WhitelistRemoved { account: *account });
        }
        Ok(())
    }

    pub fn is_whitelisted(&self, account: &AccountId) -> bool {
        self.access.is_whitelisted(account)
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    fn whitelist_one(&mut self, account: &AccountId) {
        if self.access.whitelist.insert(*account) {
            info!(account = %account, "Whitelisted");
            self.ledger.emit(Event::WhitelistAdded { account: *account });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::*;

    use super::*;

    #[test]
    fn owner_is_the_first_admin() {
        let t = Harness::new();
        assert!(t.sale.is_admin(&owner()));
        assert!(!t.sale.is_admin(&funder()));
        assert_eq!(t.sale.access().admins().count(), 1);
    }

    #[test]
    fn admins_can_add_admins() {
        let mut t = Harness::new();
        t.sale.add_admin(&owner(), &third_party()).unwrap();
        assert!(t.sale.is_admin(&third_party()));
        t.sale.add_admin(&third_party(), &funder()).unwrap();
        assert!(t.sale.is_admin(&funder()));
    }

    #[test]
    fn outsiders_cannot_add_admins() {
        let mut t = Harness::new();
        assert_eq!(
            t.sale.add_admin(&third_party(), &funder()),
            Err(SaleError::Unauthorized(third_party()))
        );
        assert!(!t.sale.is_admin(&funder()));
    }

    #[test]
    fn whitelist_is_idempotent_and_admin_only() {
        let mut t = Harness::new();
        let before = t.log.len();
        t.sale.add_to_whitelist(&owner(), &funder()).unwrap();
        t.sale.add_to_whitelist(&owner(), &funder()).unwrap();
        t.sale
            .add_whitelist(&owner(), &[funder(), third_party()])
            .unwrap();
        assert!(t.sale.is_whitelisted(&funder()));
        assert!(t.sale.is_whitelisted(&third_party()));
        assert_eq!(t.log.len(), before + 2);

        assert!(matches!(
            t.sale.add_to_whitelist(&third_party(), &owner()),
            Err(SaleError::Unauthorized(_))
        ));
        assert!(matches!(
            t.sale.remove_from_whitelist(&third_party(), &funder()),
            Err(SaleError::Unauthorized(_))
        ));

        t.sale.remove_from_whitelist(&owner(), &funder()).unwrap();
        t.sale.remove_from_whitelist(&owner(), &funder()).unwrap();
        assert!(!t.sale.is_whitelisted(&funder()));
        assert_eq!(t.sale.access().whitelisted().count(), 1);
    }
}
