pub mod config;
pub mod errors;
pub mod fetchers;
pub mod input;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod util;

// Commonly used types
pub use config::Config;
pub use errors::{CollectorError, FetchError, Result};
pub use fetchers::base::StatsFetcher;
pub use fetchers::yahoo::YahooStatsFetcher;
pub use models::stats::{DailyRecord, StatValue, Stats};
pub use models::ticker::{Ticker, Watchlist};
pub use services::collection_runner::{CollectionRunner, RunSummary};
pub use storage::daily_store::DailyOutputStore;
