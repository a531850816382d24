//! Accounting summary derived from the trade list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Summary counters folded from the full trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    /// Total number of recorded trades, pending included
    pub total_trades: u32,

    /// Number of winning trades
    pub winning_trades: u32,

    /// Gross P/L: wins added, losses subtracted by absolute value
    pub total_profit: Decimal,

    /// Flat commission accrued across qualifying wins
    pub total_commissions: Decimal,

    /// `total_profit - total_commissions`
    pub net_profit: Decimal,
}

impl TradeSummary {
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            total_profit: Decimal::ZERO,
            total_commissions: Decimal::ZERO,
            net_profit: Decimal::ZERO,
        }
    }

    /// Fraction of trades that won (0.0 to 1.0), zero when the list is empty.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.winning_trades as f64 / self.total_trades as f64
    }
}

impl Default for TradeSummary {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for TradeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total Trades:      {}", self.total_trades)?;
        writeln!(f, "Winning Trades:    {}", self.winning_trades)?;
        writeln!(f, "Win Rate:          {:.1}%", self.win_rate() * 100.0)?;
        writeln!(f, "Total P/L:         ${:.2}", self.total_profit)?;
        writeln!(f, "Total Commissions: ${:.2}", self.total_commissions)?;
        write!(f, "Net Profit:        ${:.2}", self.net_profit)
    }
}
