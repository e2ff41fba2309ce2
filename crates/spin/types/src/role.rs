use serde::{Deserialize, Serialize};

/// Ledger capabilities held by accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May create new supply.
    Minter,
    /// May pause and unpause every mutating ledger operation.
    Pauser,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Minter => write!(f, "minter"),
            Role::Pauser => write!(f, "pauser"),
        }
    }
}
