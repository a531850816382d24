//! Accounting aggregator: folds the trade list into summary counters.
//!
//! Pure over its inputs. Commission liability is a derivation
//! (`commission_due`), never a side effect of reading; persisting the
//! `commission_paid` flag is the store's explicit reconciliation step.

use rust_decimal::Decimal;

use crate::models::{Trade, TradeStatus, TradeSummary};

use super::JournalConfig;

/// Calculator folding trade records into a `TradeSummary`.
pub struct Aggregator;

impl Aggregator {
    /// Fold the trade list into summary counters. Order of the input is
    /// irrelevant to the output.
    ///
    /// Losses subtract their absolute value regardless of the sign they
    /// were stored with; pending trades only count toward the total.
    pub fn summarize(trades: &[Trade], config: &JournalConfig) -> TradeSummary {
        let total_trades = trades.len() as u32;
        let winning_trades = trades
            .iter()
            .filter(|t| t.status == TradeStatus::Win)
            .count() as u32;

        let total_profit = trades.iter().fold(Decimal::ZERO, |acc, trade| {
            match trade.status {
                TradeStatus::Win => acc + trade.profit_loss,
                TradeStatus::Loss => acc - trade.profit_loss.abs(),
                TradeStatus::Pending => acc,
            }
        });

        let qualifying = trades
            .iter()
            .filter(|t| Self::commission_due(t, config))
            .count();
        let total_commissions = config.commission_fee * Decimal::from(qualifying as u32);

        let net_profit = total_profit - total_commissions;

        TradeSummary {
            total_trades,
            winning_trades,
            total_profit,
            total_commissions,
            net_profit,
        }
    }

    /// Whether a trade owes the flat commission: a win whose profit
    /// strictly exceeds the threshold.
    pub fn commission_due(trade: &Trade, config: &JournalConfig) -> bool {
        trade.status == TradeStatus::Win && trade.profit_loss > config.commission_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PositionSide, TradeType, TraderName};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade(status: TradeStatus, profit_loss: Decimal) -> Trade {
        Trade {
            id: 0,
            symbol: "BTCUSDT".to_string(),
            position: PositionSide::Long,
            status,
            profit_loss,
            commission_paid: false,
            trader: TraderName::Stefan,
            trade_type: TradeType::Swing,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counters() {
        let trades = vec![
            trade(TradeStatus::Win, dec!(100)),
            trade(TradeStatus::Loss, dec!(-50)),
            trade(TradeStatus::Win, dec!(15)),
        ];

        let summary = Aggregator::summarize(&trades, &JournalConfig::default());

        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.winning_trades, 2);
        // 100 - 50 + 15, one qualifying win at the default $8 fee
        assert_eq!(summary.total_profit, dec!(65));
        assert_eq!(summary.total_commissions, dec!(8));
        assert_eq!(summary.net_profit, dec!(57));
    }

    #[test]
    fn test_net_profit_identity() {
        let trades = vec![
            trade(TradeStatus::Win, dec!(21)),
            trade(TradeStatus::Win, dec!(300)),
            trade(TradeStatus::Loss, dec!(75)),
            trade(TradeStatus::Pending, dec!(0)),
        ];

        let summary = Aggregator::summarize(&trades, &JournalConfig::default());
        assert_eq!(
            summary.net_profit,
            summary.total_profit - summary.total_commissions
        );
    }

    #[test]
    fn test_loss_subtracted_regardless_of_stored_sign() {
        // A loss stored as -50 contributes -50, not +50 and not -(-50)
        let negative = Aggregator::summarize(
            &[trade(TradeStatus::Loss, dec!(-50))],
            &JournalConfig::default(),
        );
        assert_eq!(negative.total_profit, dec!(-50));

        // The same loss stored with a positive sign still subtracts
        let positive = Aggregator::summarize(
            &[trade(TradeStatus::Loss, dec!(50))],
            &JournalConfig::default(),
        );
        assert_eq!(positive.total_profit, dec!(-50));
    }

    #[test]
    fn test_commission_threshold_is_strict() {
        let config = JournalConfig::default();

        assert!(!Aggregator::commission_due(
            &trade(TradeStatus::Win, dec!(20)),
            &config
        ));
        assert!(Aggregator::commission_due(
            &trade(TradeStatus::Win, dec!(21)),
            &config
        ));
        // Qualification is monotonic in profit
        assert!(Aggregator::commission_due(
            &trade(TradeStatus::Win, dec!(2100)),
            &config
        ));
        // A loss above the threshold never qualifies
        assert!(!Aggregator::commission_due(
            &trade(TradeStatus::Loss, dec!(100)),
            &config
        ));
    }

    #[test]
    fn test_pending_trades_only_count_toward_total() {
        let trades = vec![
            trade(TradeStatus::Pending, dec!(500)),
            trade(TradeStatus::Win, dec!(10)),
        ];

        let summary = Aggregator::summarize(&trades, &JournalConfig::default());
        assert_eq!(summary.total_trades, 2);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.total_profit, dec!(10));
        assert_eq!(summary.total_commissions, dec!(0));
    }

    #[test]
    fn test_configurable_commission_fee() {
        let config = JournalConfig {
            commission_fee: dec!(6),
            ..Default::default()
        };

        let trades = vec![
            trade(TradeStatus::Win, dec!(30)),
            trade(TradeStatus::Win, dec!(40)),
        ];

        let summary = Aggregator::summarize(&trades, &config);
        assert_eq!(summary.total_commissions, dec!(12));
    }

    #[test]
    fn test_summary_is_pure_and_order_independent() {
        let mut trades = vec![
            trade(TradeStatus::Win, dec!(25)),
            trade(TradeStatus::Loss, dec!(-10)),
            trade(TradeStatus::Win, dec!(5)),
        ];

        let config = JournalConfig::default();
        let forward = Aggregator::summarize(&trades, &config);
        trades.reverse();
        let reversed = Aggregator::summarize(&trades, &config);

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_already_flagged_trades_summarize_identically() {
        // The commission_paid flag is bookkeeping only; it never feeds
        // the fold, so reconciled and unreconciled lists agree.
        let unflagged = vec![trade(TradeStatus::Win, dec!(30))];
        let mut flagged = unflagged.clone();
        flagged[0].commission_paid = true;

        let config = JournalConfig::default();
        assert_eq!(
            Aggregator::summarize(&unflagged, &config),
            Aggregator::summarize(&flagged, &config)
        );
    }
}
