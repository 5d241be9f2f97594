//! Account and asset identifiers for the invoice ledger
//!
//! This module defines the party identifier used for freelancers, employers,
//! role holders and token contracts, plus the asset kind an invoice settles in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of bytes in an account identifier
pub const ACCOUNT_ID_LEN: usize = 20;

/// Party identifier
///
/// A 20-byte account identifier rendered as `0x` followed by 40 hex digits.
/// The all-zero identifier is never a valid party.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// The zero identifier, rejected wherever a party is required
    pub const ZERO: AccountId = AccountId([0u8; ACCOUNT_ID_LEN]);

    /// Build an identifier whose low-order bytes hold `value` (big-endian)
    ///
    /// Mostly useful for fixtures and configuration defaults.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes[ACCOUNT_ID_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        AccountId(bytes)
    }

    /// Returns true for the zero identifier
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);

        if digits.len() != ACCOUNT_ID_LEN * 2 {
            return Err(format!(
                "Invalid account id '{}': expected {} hex digits",
                s,
                ACCOUNT_ID_LEN * 2
            ));
        }

        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| format!("Invalid account id '{}': {}", s, e))?;
        Ok(AccountId(bytes))
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_string()
    }
}

/// Asset an invoice is denominated and settled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
    /// The settlement network's base currency
    Native,

    /// A fungible token, identified by its contract account
    Token(AccountId),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Token(token) => write!(f, "{}", token),
        }
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("native") {
            return Ok(Asset::Native);
        }
        let token: AccountId = trimmed
            .parse()
            .map_err(|e| format!("Invalid asset '{}': {}", s, e))?;
        if token.is_zero() {
            return Err(format!("Invalid asset '{}': zero token identifier", s));
        }
        Ok(Asset::Token(token))
    }
}

impl TryFrom<String> for Asset {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(value: Asset) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_account_id_display_round_trip() {
        let account = AccountId::from_low_u64(0xa1);
        let text = account.to_string();

        assert_eq!(text, "0x00000000000000000000000000000000000000a1");
        assert_eq!(text.parse::<AccountId>().unwrap(), account);
    }

    #[test]
    fn test_zero_account() {
        assert!(AccountId::ZERO.is_zero());
        assert!(!AccountId::from_low_u64(1).is_zero());
        assert_eq!(
            "0x0000000000000000000000000000000000000000"
                .parse::<AccountId>()
                .unwrap(),
            AccountId::ZERO
        );
    }

    #[rstest]
    #[case::too_short("0x1234")]
    #[case::not_hex("0xzz000000000000000000000000000000000000a1")]
    #[case::empty("")]
    fn test_account_id_parse_errors(#[case] input: &str) {
        assert!(input.parse::<AccountId>().is_err());
    }

    #[rstest]
    #[case::native("native", Asset::Native)]
    #[case::native_upper("NATIVE", Asset::Native)]
    #[case::empty("", Asset::Native)]
    #[case::token(
        "0x00000000000000000000000000000000000000c1",
        Asset::Token(AccountId::from_low_u64(0xc1))
    )]
    fn test_asset_parse(#[case] input: &str, #[case] expected: Asset) {
        assert_eq!(input.parse::<Asset>().unwrap(), expected);
    }

    #[test]
    fn test_asset_rejects_zero_token() {
        assert!("0x0000000000000000000000000000000000000000"
            .parse::<Asset>()
            .is_err());
    }
}
