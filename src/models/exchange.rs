//! Exchange model and the portfolio view derived from it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An exchange account holding part of the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// Row id assigned by the store
    pub id: i64,

    /// Display name (e.g., "Binance")
    pub name: String,

    /// Current balance in account currency
    pub balance: Decimal,

    /// When the exchange was registered
    pub created_at: DateTime<Utc>,
}

/// An exchange as submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExchange {
    pub name: String,
    pub balance: Decimal,
}

impl NewExchange {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(
                "exchange name must not be empty".to_string(),
            ));
        }
        validate_balance(self.balance)
    }
}

/// Shared balance rule for creation and balance updates.
pub fn validate_balance(balance: Decimal) -> Result<(), Error> {
    if balance <= Decimal::ZERO {
        return Err(Error::Validation(
            "balance must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Portfolio view over the current exchange set. The total is always
/// recomputed from the exchanges, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub total_balance: Decimal,
    pub exchanges: Vec<Exchange>,
}

impl Portfolio {
    pub fn from_exchanges(exchanges: Vec<Exchange>) -> Self {
        let total_balance = exchanges.iter().map(|e| e.balance).sum();
        Self {
            total_balance,
            exchanges,
        }
    }
}
