//! Live summary feed: re-derives the accounting view on every change.
//!
//! The watcher subscribes to the store's change feed and runs the same
//! refresh for the initial load and for every subsequent event, so the
//! trigger never matters to the result.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::errors::Result;
use crate::models::Portfolio;

use super::{Aggregator, JournalConfig};

/// Watches the store and reprints the summary on change.
pub struct SummaryWatcher {
    db: Database,
    config: JournalConfig,
}

impl SummaryWatcher {
    pub fn new(db: Database, config: JournalConfig) -> Self {
        Self { db, config }
    }

    /// Run until Ctrl-C. Every trade or exchange change triggers a full
    /// refetch and re-aggregation; a lagged receiver refetches too, since
    /// the refresh never depends on event contents.
    pub async fn run(&self) -> Result<()> {
        let mut changes = self.db.subscribe();

        self.refresh().await?;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("stopping summary watcher");
                    break;
                }
                event = changes.recv() => match event {
                    Ok(event) => {
                        debug!(table = ?event.table, kind = ?event.kind, "change event");
                        self.refresh().await?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed lagged, refetching");
                        self.refresh().await?;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        Ok(())
    }

    /// Fetch, aggregate, print. Never writes.
    async fn refresh(&self) -> Result<()> {
        let trades = self.db.list_trades().await?;
        let summary = Aggregator::summarize(&trades, &self.config);

        let portfolio = Portfolio::from_exchanges(self.db.list_exchanges().await?);

        println!(
            "[{}] trades: {} | wins: {} ({:.1}%) | P/L: ${:.2} | commissions: ${:.2} | net: ${:.2} | portfolio: ${:.2}",
            chrono::Local::now().format("%H:%M:%S"),
            summary.total_trades,
            summary.winning_trades,
            summary.win_rate() * 100.0,
            summary.total_profit,
            summary.total_commissions,
            summary.net_profit,
            portfolio.total_balance,
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTrade, PositionSide, TradeStatus, TradeType, TraderName};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_refresh_reads_without_writing() {
        let db = Database::in_memory().await.unwrap();
        // Subscribe before the insert: a tokio broadcast receiver only sees
        // events published after it subscribes.
        let mut changes = db.subscribe();
        db.insert_trade(&NewTrade {
            symbol: "SOLUSDT".to_string(),
            position: PositionSide::Short,
            status: TradeStatus::Win,
            profit_loss: dec!(35),
            trader: TraderName::Foxian,
            trade_type: TradeType::Swing,
            notes: None,
        })
        .await
        .unwrap();

        // Drain the insert event so only refresh-era events remain
        changes.try_recv().unwrap();

        let watcher = SummaryWatcher::new(db, JournalConfig::default());
        watcher.refresh().await.unwrap();

        // The read path published nothing: the qualifying win stays
        // unflagged until an explicit reconcile
        assert!(changes.try_recv().is_err());
        let trades = watcher.db.list_trades().await.unwrap();
        assert!(!trades[0].commission_paid);
    }
}
