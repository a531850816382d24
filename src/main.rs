//! Personal trading journal
//!
//! Records trades and exchange balances, derives accounting summaries
//! (win rate, net profit, commission due), and sizes positions from
//! acceptable loss.

mod db;
mod errors;
mod journal;
mod models;
mod risk;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::db::Database;
use crate::journal::{Aggregator, JournalConfig, SummaryWatcher};
use crate::models::{
    NewExchange, NewTrade, Portfolio, PositionSide, TradeStatus, TradeType, TraderName,
};
use crate::risk::{RiskCalculator, RiskInputs};

/// Trading journal CLI.
#[derive(Parser)]
#[command(name = "tradejournal")]
#[command(about = "Personal trading journal with accounting summaries and risk sizing", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        env = "JOURNAL_DATABASE_URL",
        default_value = "sqlite:./journal.db?mode=rwc"
    )]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Flat commission per qualifying winning trade
    #[arg(long)]
    commission_fee: Option<f64>,

    /// Profit a winning trade must strictly exceed to owe commission
    #[arg(long)]
    commission_threshold: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new trade
    AddTrade {
        /// Instrument symbol (e.g., BTCUSDT)
        #[arg(short, long)]
        symbol: String,

        /// Position direction (LONG, SHORT)
        #[arg(short, long)]
        position: String,

        /// Outcome (WIN, LOSS, PENDING)
        #[arg(long)]
        status: String,

        /// Signed profit or loss
        #[arg(long, allow_hyphen_values = true)]
        profit_loss: f64,

        /// Who took the trade (Vivian, Stefan, Foxian)
        #[arg(short, long)]
        trader: String,

        /// Holding style (Swing, Quickie)
        #[arg(long)]
        trade_type: String,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all recorded trades
    Trades,

    /// Delete a trade by id
    DeleteTrade {
        /// Trade id
        id: i64,
    },

    /// Show the accounting summary
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flag commissions on qualifying trades that are not flagged yet
    Reconcile,

    /// Watch the journal and reprint the summary on every change
    Watch,

    /// Register an exchange balance
    AddExchange {
        /// Display name (e.g., Binance)
        #[arg(short, long)]
        name: String,

        /// Current balance
        #[arg(short, long)]
        balance: f64,
    },

    /// List exchanges and the recomputed portfolio total
    Exchanges,

    /// Update an exchange balance
    UpdateExchange {
        /// Exchange id
        id: i64,

        /// New balance
        #[arg(short, long)]
        balance: f64,
    },

    /// Delete an exchange by id
    DeleteExchange {
        /// Exchange id
        id: i64,
    },

    /// Size a position from acceptable loss
    Risk {
        /// Portfolio value; defaults to the sum of exchange balances
        #[arg(long)]
        portfolio: Option<f64>,

        /// Planned entry price
        #[arg(short, long)]
        entry: f64,

        /// Stop loss price
        #[arg(short, long)]
        stop: f64,

        /// Percentage of the portfolio to risk
        #[arg(short, long, default_value = "1")]
        risk_pct: f64,

        /// Position direction (LONG, SHORT)
        #[arg(short, long, default_value = "LONG")]
        position: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = journal_config(&cli)?;
    let db = Database::new(&cli.database).await?;

    match cli.command {
        Commands::AddTrade {
            symbol,
            position,
            status,
            profit_loss,
            trader,
            trade_type,
            notes,
        } => {
            let new = NewTrade {
                symbol,
                position: parse_position(&position)?,
                status: parse_status(&status)?,
                profit_loss: Decimal::try_from(profit_loss)?,
                trader: parse_trader(&trader)?,
                trade_type: parse_trade_type(&trade_type)?,
                notes,
            };

            let trade = db.insert_trade(&new).await?;

            println!(
                "Recorded trade #{}: {} {} {} ${:.2}",
                trade.id,
                trade.symbol,
                trade.position.as_str(),
                trade.status.as_str(),
                trade.profit_loss
            );

            if Aggregator::commission_due(&trade, &config) {
                println!(
                    "Commission of ${:.2} is due for this trade. Run 'tradejournal reconcile' to flag it.",
                    config.commission_fee
                );
            }
        }

        Commands::Trades => {
            let trades = db.list_trades().await?;

            if trades.is_empty() {
                println!("No trades recorded yet. Use 'tradejournal add-trade' to add one.");
                return Ok(());
            }

            println!(
                "\n{:<5} {:<10} {:<8} {:<8} {:<6} {:<8} {:>12} {:>8} {:<17}",
                "ID", "SYMBOL", "TRADER", "TYPE", "POS", "STATUS", "P/L", "FEE", "DATE"
            );
            println!("{}", "-".repeat(92));

            for trade in &trades {
                let fee = if Aggregator::commission_due(trade, &config) {
                    format!("${:.2}", config.commission_fee)
                } else {
                    "-".to_string()
                };

                println!(
                    "{:<5} {:<10} {:<8} {:<8} {:<6} {:<8} {:>12.2} {:>8} {:<17}",
                    trade.id,
                    truncate(&trade.symbol, 10),
                    trade.trader.as_str(),
                    trade.trade_type.as_str(),
                    trade.position.as_str(),
                    trade.status.as_str(),
                    trade.profit_loss,
                    fee,
                    trade.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Commands::DeleteTrade { id } => {
            db.delete_trade(id).await?;
            println!("Deleted trade #{id}");
        }

        Commands::Summary { json } => {
            let trades = db.list_trades().await?;
            let summary = Aggregator::summarize(&trades, &config);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n=== Accounting Summary ===");
                println!("{summary}");
            }
        }

        Commands::Reconcile => {
            let flagged = db.reconcile_commissions(&config).await?;

            if flagged == 0 {
                println!("All qualifying trades are already flagged. Nothing to do.");
            } else {
                println!(
                    "Flagged {flagged} trade(s) as owing the ${:.2} commission.",
                    config.commission_fee
                );
            }
        }

        Commands::Watch => {
            println!("Watching the journal. Press Ctrl+C to stop.\n");

            let watcher = SummaryWatcher::new(db, config);
            watcher.run().await?;
        }

        Commands::AddExchange { name, balance } => {
            let exchange = db
                .insert_exchange(&NewExchange {
                    name,
                    balance: Decimal::try_from(balance)?,
                })
                .await?;

            println!(
                "Registered exchange #{}: {} with ${:.2}",
                exchange.id, exchange.name, exchange.balance
            );
        }

        Commands::Exchanges => {
            let portfolio = Portfolio::from_exchanges(db.list_exchanges().await?);

            if portfolio.exchanges.is_empty() {
                println!("No exchanges registered yet. Use 'tradejournal add-exchange' to add one.");
                return Ok(());
            }

            println!("\n{:<5} {:<16} {:>14} {:<17}", "ID", "NAME", "BALANCE", "ADDED");
            println!("{}", "-".repeat(56));

            for exchange in &portfolio.exchanges {
                println!(
                    "{:<5} {:<16} {:>14.2} {:<17}",
                    exchange.id,
                    truncate(&exchange.name, 16),
                    exchange.balance,
                    exchange.created_at.format("%Y-%m-%d %H:%M")
                );
            }

            println!("\nPortfolio total: ${:.2}", portfolio.total_balance);
        }

        Commands::UpdateExchange { id, balance } => {
            db.update_exchange_balance(id, Decimal::try_from(balance)?)
                .await?;
            println!("Updated exchange #{id} balance to ${balance:.2}");
        }

        Commands::DeleteExchange { id } => {
            db.delete_exchange(id).await?;
            println!("Deleted exchange #{id}");
        }

        Commands::Risk {
            portfolio,
            entry,
            stop,
            risk_pct,
            position,
            json,
        } => {
            let portfolio_value = match portfolio {
                Some(value) => Decimal::try_from(value)?,
                None => {
                    let total =
                        Portfolio::from_exchanges(db.list_exchanges().await?).total_balance;
                    info!(total = %total, "using portfolio total from registered exchanges");
                    total
                }
            };

            let calculation = RiskCalculator::calculate(RiskInputs {
                portfolio_value,
                entry_price: Decimal::try_from(entry)?,
                stop_loss: Decimal::try_from(stop)?,
                risk_percentage: Decimal::try_from(risk_pct)?,
                position: parse_position(&position)?,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&calculation)?);
            } else {
                println!("\n=== Risk Sizing ===");
                println!("{calculation}");
            }
        }
    }

    Ok(())
}

/// Build the journal config from defaults plus CLI overrides.
fn journal_config(cli: &Cli) -> Result<JournalConfig> {
    let mut config = JournalConfig::default();

    if let Some(fee) = cli.commission_fee {
        config.commission_fee = Decimal::try_from(fee)?;
    }
    if let Some(threshold) = cli.commission_threshold {
        config.commission_threshold = Decimal::try_from(threshold)?;
    }

    Ok(config)
}

fn parse_position(s: &str) -> Result<PositionSide> {
    PositionSide::from_str(s)
        .ok_or_else(|| anyhow::anyhow!("unknown position '{s}' (expected LONG or SHORT)"))
}

fn parse_status(s: &str) -> Result<TradeStatus> {
    TradeStatus::from_str(s)
        .ok_or_else(|| anyhow::anyhow!("unknown status '{s}' (expected WIN, LOSS, or PENDING)"))
}

fn parse_trader(s: &str) -> Result<TraderName> {
    TraderName::from_str(s)
        .ok_or_else(|| anyhow::anyhow!("unknown trader '{s}' (expected Vivian, Stefan, or Foxian)"))
}

fn parse_trade_type(s: &str) -> Result<TradeType> {
    TradeType::from_str(s)
        .ok_or_else(|| anyhow::anyhow!("unknown trade type '{s}' (expected Swing or Quickie)"))
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
