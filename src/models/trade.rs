//! Trade model representing individual journal entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LONG" => Some(Self::Long),
            "SHORT" => Some(Self::Short),
            _ => None,
        }
    }
}

/// Outcome of a trade. `Pending` trades count toward totals but carry
/// no profit, win, or commission weight until resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Win,
    Loss,
    Pending,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Win => "WIN",
            TradeStatus::Loss => "LOSS",
            TradeStatus::Pending => "PENDING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "WIN" => Some(Self::Win),
            "LOSS" => Some(Self::Loss),
            "PENDING" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Who took the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraderName {
    Vivian,
    Stefan,
    Foxian,
}

impl TraderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraderName::Vivian => "Vivian",
            TraderName::Stefan => "Stefan",
            TraderName::Foxian => "Foxian",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vivian" => Some(Self::Vivian),
            "stefan" => Some(Self::Stefan),
            "foxian" => Some(Self::Foxian),
            _ => None,
        }
    }
}

/// Holding style of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    Swing,
    Quickie,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Swing => "Swing",
            TradeType::Quickie => "Quickie",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "swing" => Some(Self::Swing),
            "quickie" => Some(Self::Quickie),
            _ => None,
        }
    }
}

/// Individual trade record in the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Row id assigned by the store
    pub id: i64,

    /// Instrument symbol (e.g., "BTCUSDT")
    pub symbol: String,

    /// Trade direction
    pub position: PositionSide,

    /// Outcome
    pub status: TradeStatus,

    /// Signed profit or loss in account currency
    pub profit_loss: Decimal,

    /// Whether the flat commission for this trade has been flagged as due
    pub commission_paid: bool,

    /// Who took the trade
    pub trader: TraderName,

    /// Holding style
    pub trade_type: TradeType,

    /// Free-form notes
    pub notes: Option<String>,

    /// When the trade was recorded
    pub created_at: DateTime<Utc>,
}

/// A trade as submitted by the user, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrade {
    pub symbol: String,
    pub position: PositionSide,
    pub status: TradeStatus,
    pub profit_loss: Decimal,
    pub trader: TraderName,
    pub trade_type: TradeType,
    pub notes: Option<String>,
}

impl NewTrade {
    /// Validate the creation contract. A winning trade must carry a
    /// positive profit; the invariant is enforced here at entry, not at
    /// storage.
    pub fn validate(&self) -> Result<(), Error> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Validation("symbol must not be empty".to_string()));
        }

        if self.status == TradeStatus::Win && self.profit_loss <= Decimal::ZERO {
            return Err(Error::Validation(
                "a winning trade must have a positive profit".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_trade(status: TradeStatus, profit_loss: Decimal) -> NewTrade {
        NewTrade {
            symbol: "BTCUSDT".to_string(),
            position: PositionSide::Long,
            status,
            profit_loss,
            trader: TraderName::Vivian,
            trade_type: TradeType::Swing,
            notes: None,
        }
    }

    #[test]
    fn test_win_requires_positive_profit() {
        assert!(new_trade(TradeStatus::Win, dec!(42.5)).validate().is_ok());

        let err = new_trade(TradeStatus::Win, dec!(-10)).validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Zero is not a positive profit either
        assert!(new_trade(TradeStatus::Win, dec!(0)).validate().is_err());
    }

    #[test]
    fn test_loss_may_carry_either_sign() {
        // Losses are recorded with whatever sign the user entered; the
        // aggregator always subtracts the absolute value.
        assert!(new_trade(TradeStatus::Loss, dec!(-50)).validate().is_ok());
        assert!(new_trade(TradeStatus::Loss, dec!(50)).validate().is_ok());
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let mut trade = new_trade(TradeStatus::Win, dec!(10));
        trade.symbol = "   ".to_string();
        assert!(matches!(trade.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!(TradeStatus::from_str("win"), Some(TradeStatus::Win));
        assert_eq!(TradeStatus::from_str("PENDING"), Some(TradeStatus::Pending));
        assert_eq!(TradeStatus::from_str("draw"), None);
        assert_eq!(PositionSide::from_str("short"), Some(PositionSide::Short));
        assert_eq!(TraderName::from_str("foxian"), Some(TraderName::Foxian));
        assert_eq!(TradeType::from_str("Quickie"), Some(TradeType::Quickie));
    }
}
