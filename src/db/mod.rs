//! Row-store over SQLite: trades and exchanges, plus a change feed.
//!
//! The store is the single external collaborator: typed CRUD per table and a
//! broadcast channel that publishes a `ChangeEvent` after every successful
//! mutation, so consumers re-derive their views uniformly whether the trigger
//! was an initial load or a later change.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::journal::{Aggregator, JournalConfig};
use crate::models::{
    Exchange, NewExchange, NewTrade, PositionSide, Trade, TradeStatus, TradeType, TraderName,
};

/// Table a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Trades,
    Exchanges,
}

/// Kind of mutation behind a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Notification published after a successful mutation.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
}

/// Stored trade row. Money is stored as REAL and converted to `Decimal`
/// at this boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TradeRow {
    id: i64,
    symbol: String,
    position: String,
    status: String,
    profit_loss: f64,
    commission_paid: bool,
    trader: String,
    trade_type: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TradeRow {
    /// Convert to the domain model. Rows with unreadable enum columns are
    /// dropped by the caller rather than failing the whole listing.
    fn into_trade(self) -> Option<Trade> {
        let position = PositionSide::from_str(&self.position)?;
        let status = TradeStatus::from_str(&self.status)?;
        let trader = TraderName::from_str(&self.trader)?;
        let trade_type = TradeType::from_str(&self.trade_type)?;
        let profit_loss = Decimal::try_from(self.profit_loss).ok()?;

        Some(Trade {
            id: self.id,
            symbol: self.symbol,
            position,
            status,
            profit_loss,
            commission_paid: self.commission_paid,
            trader,
            trade_type,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

/// Stored exchange row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ExchangeRow {
    id: i64,
    name: String,
    balance: f64,
    created_at: DateTime<Utc>,
}

impl ExchangeRow {
    fn into_exchange(self) -> Option<Exchange> {
        let balance = Decimal::try_from(self.balance).ok()?;
        Some(Exchange {
            id: self.id,
            name: self.name,
            balance,
            created_at: self.created_at,
        })
    }
}

/// Database connection pool with a change feed.
pub struct Database {
    pool: SqlitePool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Database {
    /// Connect and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// In-memory store on a single connection, for tests.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        // One connection only: each sqlite::memory: connection is its own db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let (changes, _) = broadcast::channel(64);
        let db = Self { pool, changes };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all migrations. Idempotent.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                position TEXT NOT NULL,
                status TEXT NOT NULL,
                profit_loss REAL NOT NULL,
                commission_paid INTEGER NOT NULL DEFAULT 0,
                trader TEXT NOT NULL,
                trade_type TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exchanges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                balance REAL NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_created ON trades(created_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Subscribe to the change feed. Events are published after each
    /// successful mutation; a lagged receiver should refetch.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn notify(&self, table: Table, kind: ChangeKind) {
        // Nobody listening is fine
        let _ = self.changes.send(ChangeEvent { table, kind });
    }

    // ==================== Trades ====================

    /// Insert a validated trade and return it with its assigned id.
    pub async fn insert_trade(&self, new: &NewTrade) -> Result<Trade> {
        new.validate()?;

        let created_at = Utc::now();
        let row = sqlx::query_as::<_, TradeRow>(
            r#"
            INSERT INTO trades (symbol, position, status, profit_loss, commission_paid,
                                trader, trade_type, notes, created_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.symbol.trim())
        .bind(new.position.as_str())
        .bind(new.status.as_str())
        .bind(new.profit_loss.to_f64().unwrap_or(0.0))
        .bind(new.trader.as_str())
        .bind(new.trade_type.as_str())
        .bind(new.notes.as_deref())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        let trade = row
            .into_trade()
            .ok_or_else(|| Error::Validation("stored trade failed to decode".to_string()))?;

        debug!(id = trade.id, symbol = %trade.symbol, "trade inserted");
        self.notify(Table::Trades, ChangeKind::Insert);
        Ok(trade)
    }

    /// All trades, newest first. Rows with unreadable columns are skipped
    /// with a warning rather than failing the listing.
    pub async fn list_trades(&self) -> Result<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let trades = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                let trade = row.into_trade();
                if trade.is_none() {
                    warn!(id, "skipping trade row with unreadable columns");
                }
                trade
            })
            .collect();

        Ok(trades)
    }

    /// Delete a trade by id.
    pub async fn delete_trade(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM trades WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Validation(format!("trade {id} not found")));
        }

        self.notify(Table::Trades, ChangeKind::Delete);
        Ok(())
    }

    /// Flag the commission on a single trade. A no-op on already-flagged
    /// rows, so re-running never issues a redundant write.
    pub async fn mark_commission_paid(&self, id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE trades SET commission_paid = 1 WHERE id = ? AND commission_paid = 0")
                .bind(id)
                .execute(&self.pool)
                .await?;

        let flagged = result.rows_affected() > 0;
        if flagged {
            self.notify(Table::Trades, ChangeKind::Update);
        }
        Ok(flagged)
    }

    /// Explicit reconciliation step: persist the commission flag for every
    /// qualifying trade that is not flagged yet. Returns the number of rows
    /// flagged; idempotent, so the second run returns zero. This is the only
    /// path that mutates `commission_paid` — reads never write.
    pub async fn reconcile_commissions(&self, config: &JournalConfig) -> Result<u64> {
        let trades = self.list_trades().await?;

        let mut flagged = 0u64;
        for trade in trades
            .iter()
            .filter(|t| !t.commission_paid && Aggregator::commission_due(t, config))
        {
            if self.mark_commission_paid(trade.id).await? {
                flagged += 1;
            }
        }

        Ok(flagged)
    }

    // ==================== Exchanges ====================

    /// Insert a validated exchange and return it with its assigned id.
    pub async fn insert_exchange(&self, new: &NewExchange) -> Result<Exchange> {
        new.validate()?;

        let created_at = Utc::now();
        let row = sqlx::query_as::<_, ExchangeRow>(
            r#"
            INSERT INTO exchanges (name, balance, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.name.trim())
        .bind(new.balance.to_f64().unwrap_or(0.0))
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        let exchange = row
            .into_exchange()
            .ok_or_else(|| Error::Validation("stored exchange failed to decode".to_string()))?;

        debug!(id = exchange.id, name = %exchange.name, "exchange inserted");
        self.notify(Table::Exchanges, ChangeKind::Insert);
        Ok(exchange)
    }

    /// All exchanges, newest first.
    pub async fn list_exchanges(&self) -> Result<Vec<Exchange>> {
        let rows = sqlx::query_as::<_, ExchangeRow>(
            "SELECT * FROM exchanges ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(ExchangeRow::into_exchange).collect())
    }

    /// Update an exchange balance. The balance contract is re-validated.
    pub async fn update_exchange_balance(&self, id: i64, balance: Decimal) -> Result<()> {
        crate::models::validate_balance(balance)?;

        let result = sqlx::query("UPDATE exchanges SET balance = ? WHERE id = ?")
            .bind(balance.to_f64().unwrap_or(0.0))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Validation(format!("exchange {id} not found")));
        }

        self.notify(Table::Exchanges, ChangeKind::Update);
        Ok(())
    }

    /// Delete an exchange by id.
    pub async fn delete_exchange(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM exchanges WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Validation(format!("exchange {id} not found")));
        }

        self.notify(Table::Exchanges, ChangeKind::Delete);
        Ok(())
    }
}
