//! Wallet adjustments and their audit records.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "CREDIT",
            Direction::Debit => "DEBIT",
        }
    }

    pub fn remarks(&self) -> &'static str {
        match self {
            Direction::Credit => "Amount added to wallet",
            Direction::Debit => "Amount deducted from wallet",
        }
    }

    /// Computes the balance after moving `amount` in this direction.
    ///
    /// Debits are refused when they exceed the balance; credits are unbounded.
    pub fn apply(&self, balance: &BigDecimal, amount: &BigDecimal) -> Result<BigDecimal, AppError> {
        if amount <= &BigDecimal::from(0) {
            return Err(AppError::InvalidArgument(
                "amount must be greater than zero".to_string(),
            ));
        }

        match self {
            Direction::Credit => Ok(balance + amount),
            Direction::Debit => {
                if balance < amount {
                    return Err(AppError::InsufficientFunds {
                        balance: balance.clone(),
                        requested: amount.clone(),
                    });
                }
                Ok(balance - amount)
            }
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = AppError;

    /// Accepts `CREDIT`/`DEBIT` as well as the older `ADD`/`SUBTRACT` operation names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT" | "ADD" => Ok(Direction::Credit),
            "DEBIT" | "SUBTRACT" => Ok(Direction::Debit),
            other => Err(AppError::InvalidArgument(format!(
                "unknown wallet direction '{}'",
                other
            ))),
        }
    }
}

/// A wallet movement that still has to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletAdjustment {
    pub user_id: i64,
    pub amount: BigDecimal,
    pub direction: Direction,
    /// Order whose settlement produced this adjustment, if any.
    pub order_id: Option<i64>,
}

/// Append-only audit entry, one per wallet mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletLog {
    pub id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub change_amount: BigDecimal,
    pub transaction_type: Direction,
    pub remarks: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_credit_increments_balance() {
        let got = Direction::Credit.apply(&dec("10.00"), &dec("51.00"));
        assert_eq!(got.unwrap(), dec("61.00"));
    }

    #[test]
    fn test_credit_on_negative_balance() {
        let got = Direction::Credit.apply(&dec("-5.00"), &dec("2.50"));
        assert_eq!(got.unwrap(), dec("-2.50"));
    }

    #[test]
    fn test_debit_decrements_balance() {
        let got = Direction::Debit.apply(&dec("10000.00"), &dec("6000.00"));
        assert_eq!(got.unwrap(), dec("4000.00"));
    }

    #[test]
    fn test_debit_entire_balance() {
        let got = Direction::Debit.apply(&dec("25.00"), &dec("25.00"));
        assert_eq!(got.unwrap(), dec("0"));
    }

    #[test]
    fn test_debit_not_enough_funds() {
        let got = Direction::Debit.apply(&dec("25.00"), &dec("25.01"));
        assert!(matches!(got, Err(AppError::InsufficientFunds { .. })));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        for direction in [Direction::Credit, Direction::Debit] {
            assert!(matches!(
                direction.apply(&dec("100"), &dec("0")),
                Err(AppError::InvalidArgument(_))
            ));
            assert!(matches!(
                direction.apply(&dec("100"), &dec("-1")),
                Err(AppError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("CREDIT".parse::<Direction>().unwrap(), Direction::Credit);
        assert_eq!("debit".parse::<Direction>().unwrap(), Direction::Debit);
        assert_eq!("ADD".parse::<Direction>().unwrap(), Direction::Credit);
        assert_eq!("subtract".parse::<Direction>().unwrap(), Direction::Debit);
        assert!("WITHDRAW".parse::<Direction>().is_err());
    }

    #[test]
    fn test_remarks() {
        assert_eq!(Direction::Credit.remarks(), "Amount added to wallet");
        assert_eq!(Direction::Debit.remarks(), "Amount deducted from wallet");
    }
}
