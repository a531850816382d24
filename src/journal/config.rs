//! Journal configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for commission accrual.
///
/// The flat fee is a named value rather than a literal: observed ledgers
/// disagreed between $6 and $8 per qualifying trade, so the fee is
/// configurable and defaults to the per-trade figure shown on the trade list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Flat commission charged per qualifying winning trade
    pub commission_fee: Decimal,

    /// Profit a winning trade must strictly exceed to qualify
    pub commission_threshold: Decimal,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            commission_fee: dec!(8),
            commission_threshold: dec!(20),
        }
    }
}
