use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ledger units and funding units, both in their smallest denomination.
pub type Amount = u128;

/// Seconds since the Unix epoch, as reported by a [`crate::Clock`].
pub type Timestamp = u64;

/// Opaque, address-like account key.
///
/// Accounts exist implicitly from first reference; nothing is stored until a
/// balance, allowance or lock is attached to the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Mint source and burn destination.
    pub const ZERO: AccountId = AccountId([0u8; 20]);

    /// Derive a stable account key from a human label.
    ///
    /// The same label always yields the same account, which lets configs and
    /// scripts refer to participants by name.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"spin-account-v1:");
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Short display form (first 4 bytes hex).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId(0x{})", self.short_id())
    }
}

/// Error parsing a `0x`-prefixed 20-byte hex account key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAccountError(pub String);

impl fmt::Display for ParseAccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid account id: {}", self.0)
    }
}

impl std::error::Error for ParseAccountError {}

impl FromStr for AccountId {
    type Err = ParseAccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| ParseAccountError(e.to_string()))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| ParseAccountError(format!("expected 20 bytes in {s}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter writing amounts as decimal strings and reading strings or
/// integers. Config sources and JSON scripts cannot all carry `u128` natively.
pub mod amount_serde {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            Amount::try_from(v).map_err(|_| E::custom(format!("negative amount {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.trim()
                .replace('_', "")
                .parse()
                .map_err(|_| E::custom(format!("invalid amount {v:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_stable_and_distinct() {
        assert_eq!(AccountId::derive("funder"), AccountId::derive("funder"));
        assert_ne!(AccountId::derive("funder"), AccountId::derive("wallet"));
        assert!(!AccountId::derive("funder").is_zero());
    }

    #[test]
    fn zero_account_is_zero() {
        assert!(AccountId::ZERO.is_zero());
        assert_eq!(
            AccountId::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn display_parses_back() {
        let id = AccountId::derive("creator");
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_short_keys() {
        assert!("0xdeadbeef".parse::<AccountId>().is_err());
        assert!("not-hex".parse::<AccountId>().is_err());
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Wrapped {
        #[serde(with = "amount_serde")]
        value: Amount,
    }

    #[test]
    fn amounts_accept_strings_and_integers() {
        let big: Wrapped = serde_json::from_str(r#"{"value":"1250000000000000000000000000"}"#).unwrap();
        assert_eq!(big.value, 1_250_000_000 * 10u128.pow(18));
        let small: Wrapped = serde_json::from_str(r#"{"value":42}"#).unwrap();
        assert_eq!(small.value, 42);
        let underscored: Wrapped = serde_json::from_str(r#"{"value":"1_000"}"#).unwrap();
        assert_eq!(underscored.value, 1_000);
        assert!(serde_json::from_str::<Wrapped>(r#"{"value":-1}"#).is_err());
        assert_eq!(
            serde_json::to_string(&small).unwrap(),
            r#"{"value":"42"}"#
        );
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = AccountId::derive("thirdParty");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
