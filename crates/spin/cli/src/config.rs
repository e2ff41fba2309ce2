//! Configuration for spinctl

use serde::{Deserialize, Serialize};
use spin_crowdsale::SaleConfig;
use spin_types::{AccountId, Timestamp, TokenConfig};

/// Deployment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Token metadata and genesis supply
    #[serde(default)]
    pub token: TokenConfig,

    /// Crowdsale parameters
    #[serde(default)]
    pub sale: SaleConfig,

    /// Participants of the deployment
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Participants, by label or `0x` hex key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Token creator and first crowdsale admin
    #[serde(default = "default_creator")]
    pub creator: String,

    /// Collector of purchase funds; `None` keeps funds on the sale
    #[serde(default = "default_wallet")]
    pub wallet: Option<String>,

    /// Starting clock value; `None` starts at the current time
    #[serde(default)]
    pub genesis: Option<Timestamp>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            creator: default_creator(),
            wallet: default_wallet(),
            genesis: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_creator() -> String {
    "creator".to_string()
}

fn default_wallet() -> Option<String> {
    Some("wallet".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve a label or `0x` hex key to an account.
pub fn resolve_account(name: &str) -> AccountId {
    if name.starts_with("0x") {
        if let Ok(account) = name.parse() {
            return account;
        }
    }
    AccountId::derive(name)
}

impl DeploymentConfig {
    /// Load configuration: defaults, then the optional file, then `SPIN_`
    /// environment variables (`SPIN_SALE__RATE=25`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DeploymentConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SPIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn creator(&self) -> AccountId {
        resolve_account(&self.accounts.creator)
    }

    pub fn wallet(&self) -> Option<AccountId> {
        self.accounts.wallet.as_deref().map(resolve_account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeploymentConfig::default();
        assert_eq!(config.token.symbol, "SPIN");
        assert_eq!(config.sale.rate, 10);
        assert_eq!(config.creator(), AccountId::derive("creator"));
        assert_eq!(config.wallet(), Some(AccountId::derive("wallet")));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_file_matches_defaults() {
        let config = DeploymentConfig::load(None).unwrap();
        assert_eq!(config.token.initial_supply, TokenConfig::default().initial_supply);
        assert_eq!(config.sale, SaleConfig::default());
    }

    #[test]
    fn test_hex_accounts_resolve_verbatim() {
        let account = AccountId::derive("someone");
        assert_eq!(resolve_account(&account.to_string()), account);
        assert_eq!(resolve_account("someone"), account);
    }
}
