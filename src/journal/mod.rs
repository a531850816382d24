//! Journal logic: accounting aggregation, configuration, live summary feed.

mod aggregator;
mod config;
mod watcher;

pub use aggregator::Aggregator;
pub use config::JournalConfig;
pub use watcher::SummaryWatcher;
