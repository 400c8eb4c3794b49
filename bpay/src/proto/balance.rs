//! Wallet balance query.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;

/// Wallet whose balance is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Wallet {
    /// The funding wallet.
    #[cfg_attr(feature = "cli", value(name = "FUNDING_WALLET"))]
    FundingWallet,
    /// The spot wallet.
    #[cfg_attr(feature = "cli", value(name = "SPOT_WALLET"))]
    SpotWallet,
}

impl Wallet {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FundingWallet => "FUNDING_WALLET",
            Self::SpotWallet => "SPOT_WALLET",
        }
    }
}

impl FromStr for Wallet {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FUNDING_WALLET" => Ok(Self::FundingWallet),
            "SPOT_WALLET" => Ok(Self::SpotWallet),
            other => Err(ValidationError::Wallet(other.to_owned())),
        }
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the balance query call. Without a currency, every asset is returned.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceQuery<'a> {
    /// Wallet to inspect.
    pub wallet: Wallet,
    /// Single asset to report, e.g. `BUSD`.
    pub currency: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_query_body() {
        let all = BalanceQuery {
            wallet: Wallet::SpotWallet,
            currency: None,
        };
        assert_eq!(serde_json::to_string(&all).unwrap(), r#"{"wallet":"SPOT_WALLET"}"#);

        let one = BalanceQuery {
            wallet: Wallet::FundingWallet,
            currency: Some("BUSD"),
        };
        assert_eq!(
            serde_json::to_string(&one).unwrap(),
            r#"{"wallet":"FUNDING_WALLET","currency":"BUSD"}"#
        );
    }

    #[test]
    fn test_wallet_parse() {
        assert_eq!("SPOT_WALLET".parse::<Wallet>().unwrap(), Wallet::SpotWallet);
        assert!("spot".parse::<Wallet>().is_err());
    }
}
